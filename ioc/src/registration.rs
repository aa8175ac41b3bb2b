//! Registration records: the construction recipe, ordered injection
//! directives, and the open per-registration policy map.

use crate::context::Resolver;
use crate::error::{MemberKind, ResolutionError};
use crate::key::{Instance, ServiceKey};
use crate::lifetime::{manager_for, Lifetime, LifetimeManager};
use crate::pipeline::Pipeline;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) type FactoryFn =
  Box<dyn Fn(&Resolver<'_>) -> Result<Instance, ResolutionError> + Send + Sync>;

pub(crate) type CoerceFn = Box<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

pub(crate) type ApplyFn =
  Box<dyn Fn(&Instance, &Resolver<'_>) -> Result<(), ResolutionError> + Send + Sync>;

/// How a registration produces its base instance.
pub(crate) enum Recipe {
  /// Run an erased factory.
  Factory(FactoryFn),
  /// The instance was supplied up front and lives in the lifetime slot.
  Value,
  /// Delegate to another key and coerce the payload (trait aliasing).
  Alias { target: ServiceKey, coerce: CoerceFn },
}

/// One explicit injection directive, applied to the instance after
/// construction in the order chosen by the member selector.
pub struct MemberDirective {
  pub(crate) kind: MemberKind,
  pub(crate) name: String,
  pub(crate) apply: ApplyFn,
}

impl MemberDirective {
  pub fn kind(&self) -> MemberKind {
    self.kind
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

/// Open capability map attached to a registration: anything keyed by its type
/// can ride along, e.g. a per-registration member-selector override.
#[derive(Default)]
pub struct Policies {
  map: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Policies {
  pub fn set<P: Any + Send + Sync>(&self, policy: P) {
    self.map.write().insert(TypeId::of::<P>(), Arc::new(policy));
  }

  pub fn get<P: Any + Send + Sync>(&self) -> Option<Arc<P>> {
    self
      .map
      .read()
      .get(&TypeId::of::<P>())
      .and_then(|policy| policy.clone().downcast::<P>().ok())
  }
}

/// A stored binding of an abstraction to a construction recipe and scope
/// policy.
///
/// The registration owns exactly one lifetime manager and a lazily built,
/// cached pipeline. The pipeline is immutable once built; re-registering the
/// key swaps in a whole new record, so concurrent readers of the old one stay
/// safe and the superseded manager disposes its held instance when the last
/// outstanding handle is gone.
pub struct Registration {
  pub(crate) key: ServiceKey,
  pub(crate) recipe: Recipe,
  pub(crate) lifetime: Box<dyn LifetimeManager>,
  pub(crate) members: Vec<MemberDirective>,
  pub(crate) policies: Policies,
  pub(crate) pipeline: OnceCell<Arc<Pipeline>>,
  /// Serializes first-build for scopes that guarantee build-once.
  pub(crate) build_lock: Mutex<()>,
}

impl Registration {
  pub(crate) fn new(key: ServiceKey, recipe: Recipe, lifetime: Lifetime) -> Self {
    Self {
      key,
      recipe,
      lifetime: manager_for(lifetime),
      members: Vec::new(),
      policies: Policies::default(),
      pipeline: OnceCell::new(),
      build_lock: Mutex::new(()),
    }
  }

  pub fn key(&self) -> &ServiceKey {
    &self.key
  }

  pub fn lifetime_scope(&self) -> Lifetime {
    self.lifetime.scope()
  }

  /// The declared injection directives, in registration order.
  pub fn members(&self) -> &[MemberDirective] {
    &self.members
  }

  pub fn policies(&self) -> &Policies {
    &self.policies
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn policies_are_typed_slots() {
    struct Budget(u32);

    let policies = Policies::default();
    assert!(policies.get::<Budget>().is_none());

    policies.set(Budget(3));
    assert_eq!(policies.get::<Budget>().expect("stored").0, 3);

    policies.set(Budget(5));
    assert_eq!(policies.get::<Budget>().expect("replaced").0, 5);
  }
}
