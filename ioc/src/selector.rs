//! The member-selector collaborator: decides which of a registration's
//! injection directives a pipeline applies, and in what order.

use crate::registration::Registration;

/// Yields indices into [`Registration::members`] in application order.
///
/// The engine consults the selector exactly once, when the registration's
/// pipeline is built; the result is baked into the cached pipeline and never
/// re-queried per resolve.
pub trait MemberSelector: Send + Sync {
  fn select(&self, registration: &Registration) -> Vec<usize>;
}

/// The default selector: applies directives exactly in declared order.
pub struct DeclaredOrder;

impl MemberSelector for DeclaredOrder {
  fn select(&self, registration: &Registration) -> Vec<usize> {
    (0..registration.members().len()).collect()
  }
}

/// Per-registration selector override, stored in the registration's policy
/// map. Takes precedence over the container-wide selector.
pub struct SelectorPolicy(pub std::sync::Arc<dyn MemberSelector>);
