//! Per-call resolution state: the context chain, per-resolve cache, overrides,
//! and the resolver handle handed to factories and member directives.

use crate::container::Container;
use crate::error::{FailureKind, ResolutionError};
use crate::key::{erase, recover, Instance, ServiceKey};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Upper bound on the context-chain depth. Genuine cycles are caught by key
/// comparison long before this; the bound only guards against pathological
/// registration graphs that keep generating fresh keys.
pub(crate) const MAX_DEPTH: usize = 128;

/// State shared by every context in one resolve call tree. Lives on the stack
/// of the outermost `resolve` call and never crosses threads, so the
/// per-resolve cache needs no synchronization.
pub(crate) struct CallState<'c> {
  pub(crate) container: &'c Container,
  pub(crate) overrides: &'c [Override],
  pub(crate) per_resolve: RefCell<HashMap<ServiceKey, Instance>>,
}

/// Ephemeral state for one node of the recursive construction call stack.
///
/// Each resolve or sub-resolve pushes a child context whose `parent` link
/// forms the logical call stack used for cycle detection. Contexts are
/// created at the start of a call, borrowed read-only by children, and
/// discarded when the call returns; they are never persisted.
pub struct ResolutionContext<'c> {
  pub(crate) key: ServiceKey,
  pub(crate) parent: Option<&'c ResolutionContext<'c>>,
  pub(crate) call: &'c CallState<'c>,
  pub(crate) depth: usize,
}

impl<'c> ResolutionContext<'c> {
  /// The key currently being resolved.
  pub fn key(&self) -> &ServiceKey {
    &self.key
  }

  pub fn depth(&self) -> usize {
    self.depth
  }

  /// The container the call tree started from.
  pub fn container(&self) -> &Container {
    self.call.container
  }

  /// Whether any ancestor context is resolving the same key.
  pub(crate) fn has_ancestor(&self, key: &ServiceKey) -> bool {
    let mut current = self.parent;
    while let Some(ctx) = current {
      if &ctx.key == key {
        return true;
      }
      current = ctx.parent;
    }
    false
  }

  /// Reads the per-resolve slot for `key` within this call tree.
  pub fn per_resolve_get(&self, key: &ServiceKey) -> Option<Instance> {
    self.call.per_resolve.borrow().get(key).cloned()
  }

  /// Publishes an instance into the per-resolve slot for `key`.
  pub fn per_resolve_store(&self, key: ServiceKey, instance: Instance) {
    self.call.per_resolve.borrow_mut().insert(key, instance);
  }
}

/// The handle passed to factories and member directives.
///
/// Sub-resolutions made through it run inside the surrounding call tree, so
/// they participate in cycle detection and per-resolve caching.
pub struct Resolver<'r> {
  pub(crate) ctx: &'r ResolutionContext<'r>,
}

impl<'r> Resolver<'r> {
  /// Resolves the unnamed registration of `T`.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>, ResolutionError> {
    self.resolve_named::<T>(None)
  }

  /// Resolves the registration of `T` qualified by `name`.
  pub fn resolve_named<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
  ) -> Result<Arc<T>, ResolutionError> {
    let key = ServiceKey::with_name::<T>(name);
    let erased = self
      .ctx
      .call
      .container
      .resolve_erased(key.clone(), Some(self.ctx), self.ctx.call)?;
    recover::<T>(&erased).ok_or_else(|| {
      ResolutionError::new(FailureKind::InvalidRegistration {
        key,
        reason: "registered payload does not match the requested type".to_owned(),
      })
    })
  }

  /// The key this factory or directive is building.
  pub fn key(&self) -> &ServiceKey {
    &self.ctx.key
  }

  /// The container the resolution started from.
  pub fn container(&self) -> &Container {
    self.ctx.call.container
  }
}

/// A per-call substitution: any resolution of the matching key within one
/// `resolve_with` call receives the supplied value instead of consulting the
/// registration store.
pub struct Override {
  key: ServiceKey,
  value: Instance,
}

impl Override {
  /// Substitute the unnamed registration of `T` with `value`.
  pub fn value<T: Any + Send + Sync>(value: T) -> Self {
    Self {
      key: ServiceKey::of::<T>(),
      value: erase(Arc::new(value)),
    }
  }

  /// Substitute the registration of `T` qualified by `name` with `value`.
  pub fn named<T: Any + Send + Sync>(name: &str, value: T) -> Self {
    Self {
      key: ServiceKey::named::<T>(name),
      value: erase(Arc::new(value)),
    }
  }

  /// Substitute a trait-object registration with an already shared instance.
  pub fn shared<T: ?Sized + Any + Send + Sync>(name: Option<&str>, value: Arc<T>) -> Self {
    Self {
      key: ServiceKey::with_name::<T>(name),
      value: erase(value),
    }
  }

  pub(crate) fn matches(&self, key: &ServiceKey) -> bool {
    &self.key == key
  }

  pub(crate) fn instance(&self) -> Instance {
    self.value.clone()
  }
}
