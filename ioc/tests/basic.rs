use fibre_inject::{Binder, Error, Injector, Lifetime};
use std::sync::Arc;

// --- Test Fixtures ---

// The trait must be Send + Sync for the container to accept it.
trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

// A simple struct for testing.
#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

// --- Basic Tests ---

#[test]
fn test_unnamed_singleton_factory() {
  let injector = Injector::new();
  injector.binder().add_singleton(|_| Ok(SimpleService { id: 101 }));

  let r1 = injector.get::<SimpleService>().unwrap();
  let r2 = injector.get::<SimpleService>().unwrap();

  assert_eq!(r1.id, 101);
  // Ensure it's a singleton by checking pointer equality.
  assert!(Arc::ptr_eq(&r1, &r2));
  assert_eq!(injector.lifetime_of::<SimpleService>(), Some(Lifetime::Singleton));
}

#[test]
fn test_named_instance() {
  let injector = Injector::new();
  injector
    .binder()
    .add_instance_with_name("named_instance", SimpleService { id: 202 });

  let r1 = injector.get_named::<SimpleService>("named_instance").unwrap();
  let r2 = injector.get_named::<SimpleService>("named_instance").unwrap();

  assert_eq!(r1.id, 202);
  assert!(Arc::ptr_eq(&r1, &r2));
  // The unnamed key is a different binding.
  assert!(injector.get::<SimpleService>().is_err());
}

#[test]
fn test_unnamed_transient_factory() {
  let injector = Injector::new();
  injector.binder().add_transient(|_| Ok(SimpleService { id: 303 }));

  let r1 = injector.get::<SimpleService>().unwrap();
  let r2 = injector.get::<SimpleService>().unwrap();

  assert_eq!(r1.id, 303);
  assert_eq!(r2.id, 303);
  // Ensure it's a transient by checking the pointers are different.
  assert!(!Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_unnamed_trait_resolution() {
  let injector = Injector::new();
  injector
    .binder()
    .add_singleton_trait::<dyn Greeter>(|_| Ok(Arc::new(EnglishGreeter)));

  let greeter = injector.get::<dyn Greeter>().unwrap();

  assert_eq!(greeter.greet(), "Hello!");
}

#[test]
fn test_named_trait_resolution() {
  struct GermanGreeter;
  impl Greeter for GermanGreeter {
    fn greet(&self) -> String {
      "Hallo!".to_string()
    }
  }

  let injector = Injector::new();
  injector
    .binder()
    .add_singleton_trait_with_name::<dyn Greeter>("german", |_| Ok(Arc::new(GermanGreeter)));

  let greeter = injector.get_named::<dyn Greeter>("german").unwrap();

  assert_eq!(greeter.greet(), "Hallo!");
}

#[test]
fn test_missing_service_is_an_unsatisfied_requirement() {
  struct MissingService;

  let injector = Injector::new();
  let err = injector.get::<MissingService>().err().unwrap();

  assert!(matches!(err, Error::UnsatisfiedRequirement { .. }));
  assert!(err.to_string().starts_with("unsatisfied requirement on"));
  assert!(err.to_string().contains("MissingService"));
}

#[test]
fn test_modules_run_in_order_and_last_binding_wins() {
  fn first(binder: &Binder) {
    binder.add_instance(String::from("first"));
    binder.add_instance(1u8);
  }
  fn second(binder: &Binder) {
    binder.add_instance(String::from("second"));
  }

  let injector = Injector::builder().module(first).module(second).build();

  assert_eq!(*injector.get::<String>().unwrap(), "second");
  assert_eq!(*injector.get::<u8>().unwrap(), 1);
}

#[test]
fn test_factory_errors_propagate() {
  let injector = Injector::new();
  injector.binder().add_transient::<SimpleService>(|_| {
    Err(Error::Unavailable {
      type_name: "SimpleService",
      reason: "backend offline".to_string(),
    })
  });

  let err = injector.get::<SimpleService>().unwrap_err();
  assert_eq!(err.to_string(), "SimpleService is unavailable: backend offline");
}
