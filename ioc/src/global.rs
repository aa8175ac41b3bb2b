//! The process-wide container and its accessor.

use crate::container::Container;
use once_cell::sync::Lazy;

// Root of the default hierarchy, built lazily on first use. Child containers
// hang off it via `create_child` like off any other root.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::default);

/// Returns the process-wide container.
///
/// Registration and resolution through it work exactly as on an owned
/// container; the `resolve!` macro is a panicking shorthand over this handle.
///
/// # Examples
///
/// ```
/// use weave_ioc::global;
///
/// global().register_instance(None, String::from("Hello from global!"));
///
/// let message = global().resolve::<String>(None).unwrap();
/// assert_eq!(*message, "Hello from global!");
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
