use std::sync::Arc;
use weave_ioc::{Container, Lifetime};

// --- Async Adapter Tests ---

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolve_async_returns_the_service() {
  struct Config {
    name: &'static str,
  }

  // Arrange
  let container = Container::new();
  container.register_instance(None, Config { name: "async_app" });

  // Act
  let config = container.resolve_async::<Config>(None).await.unwrap();

  // Assert
  assert_eq!(config.name, "async_app");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_construction_does_not_block_the_runtime() {
  struct SlowService;

  // Arrange
  let container = Container::new();
  container
    .register(|_| {
      std::thread::sleep(std::time::Duration::from_millis(50));
      SlowService
    })
    .lifetime(Lifetime::Singleton)
    .done();

  // Act: resolve concurrently with other async work on the same runtime.
  let resolve = container.resolve_async::<SlowService>(None);
  let side_work = async { 21 * 2 };
  let (service, answer) = tokio::join!(resolve, side_work);

  // Assert
  assert!(service.is_ok());
  assert_eq!(answer, 42);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolve_async_reports_failures_like_the_sync_path() {
  #[derive(Debug)]
  struct Missing;

  // Arrange
  let container = Container::new();

  // Act
  let error = container.resolve_async::<Missing>(None).await.unwrap_err();

  // Assert
  assert!(error.to_string().contains("no registration found"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_async_resolutions_share_one_singleton() {
  struct Shared;

  // Arrange
  let container = Container::new();
  container.register(|_| Shared).lifetime(Lifetime::Singleton).done();

  // Act
  let (a, b) = tokio::join!(
    container.resolve_async::<Shared>(None),
    container.resolve_async::<Shared>(None)
  );

  // Assert
  assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
}
