use std::panic;
use weave_ioc::{resolve, Container, FailureKind};

struct UnregisteredService;

fn main() {
  // --- Using the fallible `resolve()` method ---
  println!("Attempting to resolve a service that was never registered...");

  let container = Container::new();
  match container.resolve::<UnregisteredService>(None) {
    Ok(_) => panic!("Should not have found the service!"),
    Err(error) => {
      assert!(matches!(error.kind(), FailureKind::NotRegistered(_)));
      println!("Correctly received an error: {}", error);
    }
  }

  // --- Using the panicking `resolve!` macro ---
  // The macro goes through the global container and panics on failure, which
  // suits dependencies that are required for the application to run at all.
  println!("\nNow the same lookup through the panicking macro...");

  let result = panic::catch_unwind(|| {
    // This line will panic!
    let _service = resolve!(UnregisteredService);
  });

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");
}
