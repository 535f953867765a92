use fibre_inject::Binder;
use fibre_inject_web::{wire, App, Error, Inject, Logger, Params, WireOptions};

struct Greeting(String);

fn configure(binder: &Binder) {
  binder.add_instance(Greeting("Hello".to_string()));
}

async fn greet(
  Inject(greeting): Inject<Greeting>,
  Inject(logger): Inject<Logger>,
  params: Params,
) -> Result<String, Error> {
  let name = params.require("name")?;
  logger.info(format!("greeting {}", name));
  Ok(format!("{} {}!", greeting.0, name))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let app = App::new("simple");
  app.route("/<name>", greet)?;
  wire(&app, WireOptions::new().module(configure));

  let client = app.test_client();
  let response = client.get("/World").await;
  println!("{} {}", response.status(), response.body());
  assert_eq!(response.body(), "Hello World!");

  let missing = client.get("/").await;
  println!("{} {}", missing.status(), missing.body());
  Ok(())
}
