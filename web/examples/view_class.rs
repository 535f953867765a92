use fibre_inject::{Binder, Injector};
use fibre_inject_web::{
  wire, wrap, App, Error, HandlerError, Kwargs, RequestContext, Response, Rule, View, WireOptions,
};
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts visits across requests.
#[derive(Default)]
struct Visits(AtomicUsize);

struct Counter {
  visits: Arc<Visits>,
  label: String,
}

impl View for Counter {
  fn construct(injector: &Injector, kwargs: &Kwargs) -> fibre_inject_web::Result<Self> {
    Ok(Counter {
      visits: injector.get()?,
      label: kwargs.get_or("label", "visits".to_string())?,
    })
  }

  fn dispatch(self: Arc<Self>, _ctx: RequestContext) -> BoxFuture<'static, Result<Response, HandlerError>> {
    Box::pin(async move {
      let count = self.visits.0.fetch_add(1, Ordering::SeqCst) + 1;
      Ok(Response::ok(format!("{}: {}", self.label, count)))
    })
  }
}

fn configure(binder: &Binder) {
  binder.add_singleton(|_| Ok(Visits::default()));
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let app = App::new("view_class");
  app.add_url_rule(
    Rule::new("/").endpoint("counter"),
    Counter::as_view("counter").kwarg("label", "hits"),
  )?;
  let injector = wire(&app, WireOptions::new().module(configure));

  let client = app.test_client();
  for _ in 0..2 {
    println!("{}", client.get("/").await.body());
  }

  // The same view called directly, outside of any routed request.
  let wrapped = wrap(Counter::as_view("direct"), &app, &injector)?;
  match wrapped.call(Vec::<(String, String)>::new()).await {
    Ok(response) => println!("{}", response.body()),
    Err(error) => eprintln!("direct call failed: {}", error),
  }
  Ok(())
}
