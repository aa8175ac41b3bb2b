//! Async adapters, available with the `async` feature.

use crate::container::Container;
use crate::error::{FailureKind, ResolutionError};
use crate::key::ServiceKey;
use std::any::Any;
use std::sync::Arc;

impl Container {
  /// Resolves without blocking the async executor.
  ///
  /// Construction may take locks or run arbitrary user factories, so the
  /// whole call tree is moved onto the blocking pool. A failed join surfaces
  /// as a construction failure for the requested key.
  pub async fn resolve_async<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
  ) -> Result<Arc<T>, ResolutionError> {
    let container = self.clone();
    let owned = name.map(str::to_owned);
    tokio::task::spawn_blocking(move || container.resolve::<T>(owned.as_deref()))
      .await
      .unwrap_or_else(|join| {
        Err(ResolutionError::new(FailureKind::Construction {
          key: ServiceKey::with_name::<T>(name),
          source: Box::new(join),
        }))
      })
  }
}
