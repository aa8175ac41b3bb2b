//! # Weave IoC
//!
//! A flexible, thread-safe, and dynamic Inversion of Control (IoC) container for Rust.
//!
//! Weave IoC manages object composition for your application. Unlike containers
//! that require a single, upfront initialization, it allows dynamic registration
//! of services at any point during the application's lifecycle, and containers
//! can be nested into a hierarchy where children shadow their ancestors.
//!
//! ## Core Concepts
//!
//! - **Container**: a node of the composition hierarchy holding registrations.
//! - **Lifetime**: where a built instance is cached; transient, singleton,
//!   per-thread, per-resolve, pooled, or externally controlled.
//! - **Pipeline**: the cached per-registration chain of construction and
//!   member-injection steps, assembled by an interpreted or a compiled strategy.
//! - **Global Container**: a static, globally available container, accessible
//!   via `global()` and the `resolve!` macro.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use weave_ioc::{Container, Lifetime};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!     message: String,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         self.message.clone()
//!     }
//! }
//!
//! let container = Container::new();
//!
//! // Register a simple value.
//! container.register_instance(Some("greeting_message"), String::from("Hello, World!"));
//!
//! // Register a service that implements a trait.
//! // The factory can itself resolve other dependencies.
//! container
//!     .register(|r| {
//!         let message = r.resolve_named::<String>(Some("greeting_message")).unwrap();
//!         EnglishGreeter { message: (*message).clone() }
//!     })
//!     .lifetime(Lifetime::Singleton)
//!     .implements::<dyn Greeter>(|svc| svc)
//!     .done();
//!
//! // In another part of your application, resolve the service by its trait.
//! let greeter = container.resolve::<dyn Greeter>(None).unwrap();
//! assert_eq!(greeter.greet(), "Hello, World!");
//! ```

#[cfg(feature = "async")]
mod async_ext;
mod container;
mod context;
mod error;
mod global;
mod key;
mod lifetime;
mod macros;
mod pipeline;
mod registration;
mod registry;
mod selector;

pub use container::{Container, ContainerBuilder, Registrar, ResolveAll};
pub use context::{Override, ResolutionContext, Resolver};
pub use error::{
  DefaultDiagnostics, DiagnosticsFormatter, FailureKind, MemberKind, ResolutionError, TrailFrame,
};
pub use global::global;
pub use key::{Instance, ServiceKey};
pub use lifetime::{Lifetime, LifetimeManager};
pub use pipeline::{Pipeline, PipelineStrategy};
pub use registration::{MemberDirective, Policies, Registration};
pub use selector::{DeclaredOrder, MemberSelector, SelectorPolicy};
