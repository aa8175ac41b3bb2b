use serial_test::serial;
use std::sync::Arc;
use weave_ioc::{global, resolve, Lifetime};

// These tests share the process-wide global container, so they register under
// unique names or types and run serially.

trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

#[test]
#[serial]
fn global_container_is_reachable_from_anywhere() {
  // Arrange
  fn register_elsewhere() {
    global().register_instance(Some("global_message"), String::from("registered far away"));
  }
  register_elsewhere();

  // Act
  let message = global().resolve::<String>(Some("global_message")).unwrap();

  // Assert
  assert_eq!(*message, "registered far away");
}

#[test]
#[serial]
fn resolve_macro_returns_the_service() {
  // Arrange
  struct MacroService {
    id: u32,
  }
  global()
    .register(|_| MacroService { id: 7 })
    .lifetime(Lifetime::Singleton)
    .done();

  // Act
  let service = resolve!(MacroService);

  // Assert
  assert_eq!(service.id, 7);
}

#[test]
#[serial]
fn resolve_macro_supports_named_registrations() {
  // Arrange
  global().register_instance(Some("macro_named"), 123_i64);

  // Act
  let value = resolve!(i64, "macro_named");

  // Assert
  assert_eq!(*value, 123);
}

#[test]
#[serial]
fn resolve_macro_supports_trait_objects() {
  // Arrange
  global().register_trait::<dyn Greeter>(None, Lifetime::Singleton, |_| Arc::new(EnglishGreeter));

  // Act
  let greeter = resolve!(trait Greeter);

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
}

#[test]
#[serial]
fn resolve_macro_supports_named_trait_objects() {
  // Arrange
  struct GermanGreeter;
  impl Greeter for GermanGreeter {
    fn greet(&self) -> String {
      "Hallo!".to_string()
    }
  }
  global().register_trait::<dyn Greeter>(Some("german"), Lifetime::Singleton, |_| {
    Arc::new(GermanGreeter)
  });

  // Act
  let greeter = resolve!(trait Greeter, "german");

  // Assert
  assert_eq!(greeter.greet(), "Hallo!");
}

#[test]
#[serial]
#[should_panic(expected = "Failed to resolve required service")]
fn resolve_macro_panics_on_missing_concrete_service() {
  struct MissingService;
  resolve!(MissingService);
}

#[test]
#[serial]
#[should_panic(expected = "Failed to resolve required trait service")]
fn resolve_macro_panics_on_missing_trait_service() {
  trait MissingTrait: Send + Sync {}
  resolve!(trait MissingTrait);
}

#[test]
#[serial]
fn custom_container_is_isolated_from_global() {
  use weave_ioc::Container;

  // Arrange
  let custom = Container::new();
  global().register_instance(Some("global_only"), String::from("I am global"));
  custom.register_instance(None, String::from("I am local"));

  // Act & Assert
  assert_eq!(*resolve!(String, "global_only"), "I am global");
  assert!(global().resolve::<String>(None).is_err() || *global().resolve::<String>(None).unwrap() != "I am local");
  assert_eq!(*custom.resolve::<String>(None).unwrap(), "I am local");
  assert!(custom.resolve::<String>(Some("global_only")).is_err());
}
