use weave_ioc::Container;

// A function that configures dependencies and runs some logic.
// By accepting a `&Container`, it can be tested with a controlled environment.
fn process_data(container: &Container) -> String {
  let data = container
    .resolve::<String>(None)
    .expect("Data not found in container");
  format!("Processed: {}", data.to_uppercase())
}

fn main() {
  // --- A hierarchy of containers ---
  // The root holds application-wide services; each unit of work gets its own
  // child that can add or shadow registrations without touching the root.
  println!("--- Running with a container hierarchy ---");
  let root = Container::new();
  root.register_instance(None, "shared data".to_string());

  let request_scope = root.create_child();
  let result = process_data(&request_scope);
  println!("Child sees the root's data: {}", result);
  assert_eq!(result, "Processed: SHARED DATA");

  // The child shadows the root's registration for its own callers.
  request_scope.register_instance(None, "request data".to_string());
  let result = process_data(&request_scope);
  println!("Child now shadows it:      {}", result);
  assert_eq!(result, "Processed: REQUEST DATA");

  // --- Verify Isolation ---
  // The shadowing registration never leaked upward.
  let at_root = process_data(&root);
  assert_eq!(at_root, "Processed: SHARED DATA");

  // Disposing the child ends its scope; the root keeps working.
  request_scope.dispose();
  assert!(request_scope.resolve::<String>(None).is_err());
  assert_eq!(process_data(&root), "Processed: SHARED DATA");

  println!("\nVerified that child scopes are isolated from their root.");
}
