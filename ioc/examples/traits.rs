use std::sync::Arc;
use weave_ioc::{Container, Lifetime};

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    // ... logic to generate report ...
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---

  // Register ConsoleLogger once, reachable both as the concrete type and as
  // the `dyn Logger` abstraction it implements.
  container
    .register(|_| ConsoleLogger)
    .lifetime(Lifetime::Singleton)
    .implements::<dyn Logger>(|logger| logger)
    .done();

  // Register the ReportService. Its factory *resolves* its own dependency
  // (the logger). This is the "inversion of control": ReportService doesn't
  // create its logger.
  container
    .register(|r| ReportService {
      logger: r.resolve::<dyn Logger>().unwrap(),
    })
    .lifetime(Lifetime::Singleton)
    .done();

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = container.resolve::<ReportService>(None).unwrap();

  println!("Using the service...");
  report_service.generate_report();

  // The output shows messages from the ConsoleLogger, proving the dependency
  // was injected.
}
