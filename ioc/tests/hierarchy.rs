use pretty_assertions::assert_eq;
use std::sync::Arc;
use weave_ioc::{Container, FailureKind, Lifetime};

// --- Hierarchy Tests ---

#[test]
fn child_resolves_registrations_from_its_ancestors() {
  struct AppConfig {
    name: &'static str,
  }

  // Arrange
  let root = Container::new();
  root.register_instance(None, AppConfig { name: "app_v1" });

  let child = root.create_child();
  let grandchild = child.create_child();

  // Act & Assert: the whole chain sees the root's registration.
  assert_eq!(child.resolve::<AppConfig>(None).unwrap().name, "app_v1");
  assert_eq!(grandchild.resolve::<AppConfig>(None).unwrap().name, "app_v1");
}

#[test]
fn parent_cannot_see_child_registrations() {
  #[derive(Debug)]
  struct RequestScoped;

  // Arrange
  let root = Container::new();
  let child = root.create_child();
  child.register(|_| RequestScoped).done();

  // Act & Assert
  assert!(child.resolve::<RequestScoped>(None).is_ok());
  assert!(matches!(
    root.resolve::<RequestScoped>(None).unwrap_err().kind(),
    FailureKind::NotRegistered(_)
  ));
}

#[test]
fn child_registration_shadows_the_parent() {
  // Arrange
  let root = Container::new();
  root.register_instance(Some("env"), "production".to_string());

  let child = root.create_child();
  child.register_instance(Some("env"), "staging".to_string());

  // Act & Assert: resolution starts at the requesting node.
  assert_eq!(*child.resolve::<String>(Some("env")).unwrap(), "staging");
  assert_eq!(*root.resolve::<String>(Some("env")).unwrap(), "production");
}

#[test]
fn separate_containers_are_isolated() {
  // Arrange
  let first = Container::new();
  let second = Container::new();

  first.register_instance(None, String::from("I live in the first container"));

  // Act & Assert
  assert!(first.resolve::<String>(None).is_ok());
  assert!(second.resolve::<String>(None).is_err());
}

#[test]
fn child_resolving_a_parent_transient_gets_a_fresh_instance() {
  struct Worker;

  // Arrange: transient registered only on the parent.
  let root = Container::new();
  root.register(|_| Worker).done();
  let child = root.create_child();

  // Act
  let from_root = root.resolve::<Worker>(None).unwrap();
  let from_child = child.resolve::<Worker>(None).unwrap();

  // Assert: the child succeeds, and transient scope still means a new
  // instance per resolve.
  assert!(!Arc::ptr_eq(&from_root, &from_child));
}

#[test]
fn singleton_held_by_an_ancestor_is_shared_with_all_descendants() {
  struct Cache;

  // Arrange
  let root = Container::new();
  root.register(|_| Cache).lifetime(Lifetime::Singleton).done();

  let child_a = root.create_child();
  let child_b = root.create_child();

  // Act
  let from_a = child_a.resolve::<Cache>(None).unwrap();
  let from_b = child_b.resolve::<Cache>(None).unwrap();

  // Assert: one registration record means one instance.
  assert!(Arc::ptr_eq(&from_a, &from_b));
}

#[test]
fn resolve_all_walks_the_chain_and_deduplicates_names() {
  trait Handler: Send + Sync {
    fn tag(&self) -> &'static str;
  }
  struct Tagged(&'static str);
  impl Handler for Tagged {
    fn tag(&self) -> &'static str {
      self.0
    }
  }

  // Arrange: two names on the root, one of them shadowed by the child.
  let root = Container::new();
  root.register_trait::<dyn Handler>(Some("metrics"), Lifetime::Transient, |_| {
    Arc::new(Tagged("root-metrics"))
  });
  root.register_trait::<dyn Handler>(Some("audit"), Lifetime::Transient, |_| {
    Arc::new(Tagged("root-audit"))
  });

  let child = root.create_child();
  child.register_trait::<dyn Handler>(Some("metrics"), Lifetime::Transient, |_| {
    Arc::new(Tagged("child-metrics"))
  });
  child.register_trait::<dyn Handler>(Some("tracing"), Lifetime::Transient, |_| {
    Arc::new(Tagged("child-tracing"))
  });

  // Act
  let mut tags: Vec<&'static str> = child
    .resolve_all::<dyn Handler>()
    .map(|item| item.unwrap().tag())
    .collect();
  tags.sort_unstable();

  // Assert: one entry per distinct name, the child's "metrics" winning.
  assert_eq!(tags, vec!["child-metrics", "child-tracing", "root-audit"]);
}

#[test]
fn resolve_all_skips_the_unnamed_registration() {
  // Arrange
  let container = Container::new();
  container.register_instance(None, 1_u32);
  container.register_instance(Some("named"), 2_u32);

  // Act
  let values: Vec<u32> = container.resolve_all::<u32>().map(|v| *v.unwrap()).collect();

  // Assert
  assert_eq!(values, vec![2]);
}

#[test]
fn resolve_all_surfaces_per_item_failures() {
  struct Fragile;

  #[derive(Debug, thiserror::Error)]
  #[error("boom")]
  struct Boom;

  // Arrange: one healthy and one failing named registration.
  let container = Container::new();
  container.register(|_| Fragile).named("ok").done();
  container
    .try_register(|_| -> Result<Fragile, Box<dyn std::error::Error + Send + Sync>> {
      Err(Box::new(Boom))
    })
    .named("broken")
    .done();

  // Act
  let outcomes: Vec<bool> = container.resolve_all::<Fragile>().map(|r| r.is_ok()).collect();

  // Assert: the sequence yields both, failure and success alike.
  assert_eq!(outcomes.len(), 2);
  assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
}

#[test]
fn disposed_container_refuses_to_resolve() {
  // Arrange
  let container = Container::new();
  container.register_instance(None, 7_u32);
  assert_eq!(*container.resolve::<u32>(None).unwrap(), 7);

  // Act
  container.dispose();

  // Assert
  assert!(container.is_disposed());
  assert!(matches!(
    container.resolve::<u32>(None).unwrap_err().kind(),
    FailureKind::ContainerDisposed
  ));
}

#[test]
fn disposing_a_child_leaves_the_parent_usable() {
  // Arrange
  let root = Container::new();
  root.register_instance(None, String::from("still here"));
  let child = root.create_child();

  // Act
  child.dispose();

  // Assert
  assert!(child.resolve::<String>(None).is_err());
  assert_eq!(*root.resolve::<String>(None).unwrap(), "still here");
}

#[test]
fn child_reports_its_parent() {
  let root = Container::new();
  let child = root.create_child();

  assert!(root.parent().is_none());
  assert!(child.parent().is_some());
}
