//! Keys identifying a registered abstraction: a type plus an optional qualifier name.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// The type-erased instance passed between pipeline steps and lifetime slots.
///
/// The payload is always an `Arc<T>` for the registered abstraction `T`, so
/// recovery works uniformly for sized types and trait objects alike.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps a shared instance into the erased currency.
pub(crate) fn erase<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Instance {
  Arc::new(value)
}

/// Recovers a typed handle from the erased currency, if the payload matches.
pub(crate) fn recover<T: ?Sized + Any + Send + Sync>(instance: &Instance) -> Option<Arc<T>> {
  instance.downcast_ref::<Arc<T>>().cloned()
}

/// Identifies one registration slot: the abstraction's `TypeId` plus an
/// optional qualifier name. Two registrations for the same type under
/// different names are independent.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
  type_id: TypeId,
  name: Option<String>,
  type_name: &'static str,
}

impl ServiceKey {
  /// Key for the unnamed (default) registration of `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      name: None,
      type_name: std::any::type_name::<T>(),
    }
  }

  /// Key for the registration of `T` qualified by `name`.
  pub fn named<T: ?Sized + Any>(name: &str) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      name: Some(name.to_owned()),
      type_name: std::any::type_name::<T>(),
    }
  }

  pub fn with_name<T: ?Sized + Any>(name: Option<&str>) -> Self {
    match name {
      Some(n) => Self::named::<T>(n),
      None => Self::of::<T>(),
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// The abstraction's type name, kept for diagnostics only.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }
}

impl fmt::Display for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{} (name: \"{}\")", self.type_name, name),
      None => f.write_str(self.type_name),
    }
  }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "Key({}, \"{}\")", self.type_name, name),
      None => write!(f, "Key({})", self.type_name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn named_and_unnamed_keys_differ() {
    assert_ne!(ServiceKey::of::<String>(), ServiceKey::named::<String>("a"));
    assert_ne!(ServiceKey::named::<String>("a"), ServiceKey::named::<String>("b"));
    assert_eq!(ServiceKey::of::<String>(), ServiceKey::with_name::<String>(None));
  }

  #[test]
  fn erase_and_recover_round_trip() {
    let erased = erase(Arc::new(7_u32));
    assert_eq!(*recover::<u32>(&erased).unwrap(), 7);
    assert!(recover::<String>(&erased).is_none());
  }
}
