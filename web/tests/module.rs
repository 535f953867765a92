//! Default bindings installed by `wire`.

use fibre_inject::Error as InjectError;
use fibre_inject_web::{
  wire, App, Config, Error, Inject, Logger, Method, Request, Rule, Session, StatusCode, WireOptions,
  Websocket,
};
use pretty_assertions::assert_eq;

#[test]
fn test_it_should_return_passed_application() {
  let app = App::new("module");
  let injector = wire(&app, WireOptions::new());

  let resolved = injector.get::<App>().unwrap();

  assert!(resolved.ptr_eq(&app));
}

#[test]
fn test_it_should_return_passed_applications_configuration() {
  let config = Config::from_yaml_str("SECRET_KEY: dev\n").unwrap();
  let app = App::with_config("module", config);
  let injector = wire(&app, WireOptions::new());

  let resolved = injector.get::<Config>().unwrap();

  assert!(resolved.ptr_eq(app.config()));
  assert_eq!(resolved.get::<String>("SECRET_KEY").unwrap().as_deref(), Some("dev"));
}

#[test]
fn test_it_should_return_logger() {
  let app = App::new("module");
  let injector = wire(&app, WireOptions::new());

  let logger = injector.get::<Logger>().unwrap();

  assert_eq!(logger.name(), "module");
  assert_eq!(logger.name(), app.logger().name());
}

#[tokio::test]
async fn test_it_should_return_request() {
  let app = App::new("module");
  app
    .route("/items/<id>", |Inject(request): Inject<Request>| async move {
      format!(
        "{} {} {}",
        request.method(),
        request.path(),
        request.args().get("page").unwrap_or("-")
      )
    })
    .unwrap();
  wire(&app, WireOptions::new());

  let response = app.test_client().get("/items/3?page=2").await;

  assert_eq!(response.body(), "GET /items/3 2");
}

#[tokio::test]
async fn test_it_should_return_post_body() {
  let app = App::new("module");
  app
    .add_url_rule(
      Rule::new("/echo").methods([Method::POST]),
      |Inject(request): Inject<Request>| async move { request.body().to_string() },
    )
    .unwrap();
  wire(&app, WireOptions::new());

  let client = app.test_client();

  assert_eq!(client.post("/echo", "payload").await.body(), "payload");
  assert_eq!(
    client.get("/echo").await.status(),
    StatusCode::METHOD_NOT_ALLOWED
  );
}

#[tokio::test]
async fn test_it_should_return_websocket() {
  let app = App::new("module");
  app
    .websocket(
      "/ws",
      |Inject(ws): Inject<Websocket>, request: Option<Inject<Request>>| async move {
        let message = ws.receive().await?;
        ws.send(format!("{} {} {}", ws.path(), message, request.is_some()))
      },
    )
    .unwrap();
  wire(&app, WireOptions::new());

  let mut connection = app.test_client().websocket("/ws");
  connection.send("hello").unwrap();

  assert_eq!(connection.receive().await.unwrap(), "/ws hello false");
  connection.close().await;
}

#[tokio::test]
async fn test_it_should_return_session() {
  let app = App::new("module");
  app
    .route("/visit", |Inject(session): Inject<Session>| async move {
      let visits = session.get::<u32>("visits").unwrap_or(0) + 1;
      session.insert("visits", visits)?;
      Ok::<_, Error>(visits.to_string())
    })
    .unwrap();
  wire(&app, WireOptions::new());

  let client = app.test_client();
  client.get("/visit").await;
  let response = client.get("/visit").await;

  assert_eq!(response.body(), "2");
  assert_eq!(client.session().get::<u32>("visits"), Some(2));
}

#[test]
fn test_request_and_websocket_are_unavailable_outside_their_context() {
  let app = App::new("module");
  let injector = wire(&app, WireOptions::new());
  let scope = injector.request_scope().clone();

  scope.push();
  let request = injector.get::<Request>().err().unwrap();
  let websocket = injector.get::<Websocket>().err().unwrap();
  let session = injector.get::<Session>();
  scope.pop().unwrap();

  assert!(matches!(request, InjectError::Unavailable { .. }));
  assert!(request.to_string().contains("working outside of request context"));
  assert!(matches!(websocket, InjectError::Unavailable { .. }));
  assert!(session.is_ok());
}

#[test]
fn test_app_binding_does_not_keep_the_app_alive() {
  let app = App::new("module");
  let injector = wire(&app, WireOptions::new());
  let weak = app.downgrade();

  drop(app);

  assert!(weak.upgrade().is_none());
  assert!(matches!(
    injector.get::<App>().err().unwrap(),
    InjectError::Unavailable { .. }
  ));
}
