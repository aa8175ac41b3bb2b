//! Public macros for ergonomic service resolution.

/// Resolves a service from the global container.
///
/// This macro is the shorthand way to get dependencies. It panics if the
/// requested service cannot be resolved, ensuring that all required
/// dependencies are present at runtime.
///
/// # Panics
///
/// This macro will panic if the service cannot be resolved. For a
/// non-panicking version, use `global().resolve(...)` directly.
///
/// # Examples
///
/// ```
/// use weave_ioc::{global, resolve};
///
/// // Register a simple type
/// global().register_instance(None, String::from("hello"));
///
/// // Resolve it
/// let message = resolve!(String);
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use weave_ioc::{global, resolve, Lifetime};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// // Register a trait implementation
/// global().register_trait::<dyn Greeter>(None, Lifetime::Singleton, |_| Arc::new(EnglishGreeter));
///
/// // Resolve the trait object
/// let greeter = resolve!(trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a concrete type: resolve!(MyService)
    ($type:ty) => {
        $crate::global()
            .resolve::<$type>(None)
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required service {}: {}",
                    std::any::type_name::<$type>(),
                    error
                )
            })
    };

    // Arm for resolving a named concrete type: resolve!(MyService, "name")
    ($type:ty, $name:expr) => {
        $crate::global()
            .resolve::<$type>(Some($name))
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required service {} with name '{}': {}",
                    std::any::type_name::<$type>(),
                    $name,
                    error
                )
            })
    };

    // Arm for resolving a trait object: resolve!(trait MyTrait)
    // We use `:ident` to capture the trait's name, not `:ty`, so we can
    // construct `dyn Trait` inside the macro expansion.
    (trait $trait_ident:ident) => {
        $crate::global()
            .resolve::<dyn $trait_ident>(None)
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required trait service {}: {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    error
                )
            })
    };

    // Arm for resolving a named trait object: resolve!(trait MyTrait, "name")
    (trait $trait_ident:ident, $name:expr) => {
        $crate::global()
            .resolve::<dyn $trait_ident>(Some($name))
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required trait service {} with name '{}': {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    $name,
                    error
                )
            })
    };
}
