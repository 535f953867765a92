use fibre_inject::{resolve_from, Binder, Injectable, Injector, Lifetime, Result};
use std::sync::Arc;

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

impl Injectable for ReportService {
  const LIFETIME: Lifetime = Lifetime::Singleton;

  fn construct(injector: &Injector) -> Result<Self> {
    Ok(ReportService {
      logger: injector.get::<dyn Logger>()?,
    })
  }
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn configure(binder: &Binder) {
  // The container stores Arc<ConsoleLogger> but serves it as Arc<dyn Logger>.
  binder.add_singleton_trait::<dyn Logger>(|_| Ok(Arc::new(ConsoleLogger)));
}

fn main() {
  let injector = Injector::builder().module(configure).build();

  // ReportService was never registered; auto-binding builds it from its
  // declared dependencies.
  println!("Resolving the high-level service...");
  let report_service = injector.resolve::<ReportService>().unwrap();
  report_service.generate_report();

  let logger = resolve_from!(injector, trait Logger);
  logger.log("Resolved the abstraction directly.");
}
