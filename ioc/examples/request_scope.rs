use fibre_inject::{local_stack, Binder, Injector};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A per-request unit of work that gets a unique ID upon creation.
struct UnitOfWork {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn configure(binder: &Binder) {
  binder.add_request_scoped(|_| {
    let id = ID_COUNTER.fetch_add(1, Ordering::SeqCst);
    println!("Creating UnitOfWork #{}...", id);
    Ok(UnitOfWork { id })
  });
}

// Simulates one request: open a scope, resolve twice, close the scope.
async fn handle_request(injector: Arc<Injector>, name: &'static str) -> usize {
  local_stack::isolate(async move {
    injector.request_scope().push();
    let first = injector.get::<UnitOfWork>().unwrap();
    tokio::task::yield_now().await;
    let second = injector.get::<UnitOfWork>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    println!("{} used UnitOfWork #{} for both resolutions", name, first.id);
    injector.request_scope().pop().unwrap();
    first.id
  })
  .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let injector = Injector::builder().module(configure).build();

  println!("--- Two concurrent requests ---");
  let (a, b) = tokio::join!(
    handle_request(injector.clone(), "request A"),
    handle_request(injector.clone(), "request B"),
  );
  assert_ne!(a, b, "Concurrent requests must not share scoped instances");

  println!("\n--- A later request ---");
  let c = handle_request(injector, "request C").await;
  assert_ne!(a, c);
}
