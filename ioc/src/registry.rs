//! The per-container registration store: one slice of the hierarchy's
//! key -> registration mapping.

use crate::key::ServiceKey;
use crate::registration::Registration;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Concurrent store for one container node. Readers see consistent snapshots
/// while writers append; writers serialize per slot.
#[derive(Default)]
pub(crate) struct Registry {
  slots: DashMap<ServiceKey, Arc<Registration>>,
}

impl Registry {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Atomically swaps the slot for the registration's key, returning whatever
  /// record it displaced so the caller can let it dispose by drop.
  pub(crate) fn register(&self, registration: Registration) -> Option<Arc<Registration>> {
    let key = registration.key().clone();
    self.slots.insert(key, Arc::new(registration))
  }

  /// Looks up this slice only; walking the parent chain is the container's
  /// concern.
  pub(crate) fn lookup(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
    self.slots.get(key).map(|entry| entry.value().clone())
  }

  /// Realizes a registration on first request; concurrent callers converge on
  /// the record created by whichever got there first.
  pub(crate) fn get_or_create(
    &self,
    key: ServiceKey,
    init: impl FnOnce() -> Registration,
  ) -> Arc<Registration> {
    self
      .slots
      .entry(key)
      .or_insert_with(|| Arc::new(init()))
      .value()
      .clone()
  }

  /// Snapshot of the named keys registered for `type_id` in this slice.
  pub(crate) fn named_keys_of(&self, type_id: TypeId) -> Vec<ServiceKey> {
    self
      .slots
      .iter()
      .filter(|entry| entry.key().type_id() == type_id && entry.key().name().is_some())
      .map(|entry| entry.key().clone())
      .collect()
  }

  pub(crate) fn len(&self) -> usize {
    self.slots.len()
  }
}
