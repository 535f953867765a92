use fibre_inject::{Binder, Error as InjectError, Injectable, Injector};
use fibre_inject_web::{
  wire, App, Config, CurrentResponse, Error, Failure, HandlerError, Inject, RequestContext,
  Response, StatusCode, WireOptions, Websocket, INJECTOR_EXTENSION,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Fixtures ---

struct EmptyClass;

impl Injectable for EmptyClass {
  fn construct(_: &Injector) -> fibre_inject::Result<Self> {
    Ok(EmptyClass)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("custom error")]
struct CustomError;

type Seen = Arc<Mutex<Vec<Arc<EmptyClass>>>>;

fn configure(binder: &Binder) {
  binder.add_request_scoped(|_| Ok(EmptyClass));
}

async fn view() -> &'static str {
  "content here"
}

async fn error_view() -> Result<&'static str, CustomError> {
  Err(CustomError)
}

async fn template_view(ctx: RequestContext) -> Result<String, HandlerError> {
  ctx
    .render_template_string("{{ content }}", [("content", "content here")])
    .await
}

async fn processed_view(ctx: RequestContext) -> Result<String, HandlerError> {
  ctx
    .render_template_string("{{ content }} {{ extra }}", [("content", "content here")])
    .await
}

async fn websocket(Inject(ws): Inject<Websocket>) -> Result<(), Error> {
  let message = ws.receive().await?;
  ws.send(message)
}

fn factory() -> App {
  let app = App::new("wire");
  app.route("/", view).unwrap();
  app.route("/error", error_view).unwrap();
  app.route("/template", template_view).unwrap();
  app.route("/processed", processed_view).unwrap();
  app.websocket("/ws", websocket).unwrap();
  app
}

/// A hook body that records the injected instance.
fn recorder(seen: &Seen) -> impl Fn(Inject<EmptyClass>) -> std::future::Ready<()> + Clone {
  let seen = seen.clone();
  move |Inject(empty): Inject<EmptyClass>| {
    seen.lock().push(empty);
    std::future::ready(())
  }
}

async fn echo_over_websocket(app: &App) {
  let mut connection = app.test_client().websocket("/ws");
  connection.send("ping").unwrap();
  assert_eq!(connection.receive().await.unwrap(), "ping");
  connection.close().await;
}

// --- Container setup ---

#[test]
fn test_it_should_attach_container_to_application() {
  let app = App::new("wire");

  let injector = wire(&app, WireOptions::new());

  assert_eq!(INJECTOR_EXTENSION, "injector");
  let attached = app.extension::<Injector>("injector").unwrap();
  assert!(Arc::ptr_eq(&attached, &injector));
  assert!(Arc::ptr_eq(&app.injector().unwrap(), &injector));
}

#[test]
fn test_it_should_register_configuration_modules_with_container() {
  let app = App::new("wire");

  let injector = wire(
    &app,
    WireOptions::new()
      .module(|binder: &Binder| binder.add_instance(String::from("first")))
      .module(|binder: &Binder| binder.add_instance(7u32)),
  );

  assert_eq!(*injector.get::<String>().unwrap(), "first");
  assert_eq!(*injector.get::<u32>().unwrap(), 7);
}

#[test]
fn test_it_should_register_default_module_with_container() {
  let app = App::new("wire");

  let injector = wire(&app, WireOptions::new());

  assert!(injector.get::<App>().unwrap().ptr_eq(&app));
  assert!(injector.get::<Config>().unwrap().ptr_eq(app.config()));
}

#[test]
fn test_it_should_register_default_module_first() {
  let app = App::new("wire");
  let config = Config::new();
  let bound = config.clone();

  let injector = wire(
    &app,
    WireOptions::new().module(move |binder: &Binder| binder.add_instance(bound.clone())),
  );

  assert!(injector.get::<App>().unwrap().ptr_eq(&app));
  assert!(injector.get::<Config>().unwrap().ptr_eq(&config));
  assert!(!injector.get::<Config>().unwrap().ptr_eq(app.config()));
}

#[test]
fn test_it_should_pass_auto_bind_to_container() {
  let auto_bind_app = App::new("auto");
  let auto_bind = wire(&auto_bind_app, WireOptions::new().auto_bind(true));

  let non_auto_bind_app = App::new("manual");
  let non_auto_bind = wire(&non_auto_bind_app, WireOptions::new().auto_bind(false));

  assert!(auto_bind.resolve::<EmptyClass>().is_ok());

  let err = non_auto_bind.resolve::<EmptyClass>().err().unwrap();
  assert!(matches!(err, InjectError::UnsatisfiedRequirement { .. }));
  assert!(err.to_string().starts_with("unsatisfied requirement on"));
  assert!(err.to_string().contains("EmptyClass"));
}

#[test]
fn test_it_should_register_parent_with_container() {
  let app = App::new("wire");
  let parent = Injector::new();
  parent.binder().add_instance(String::from("from parent"));

  let injector = wire(&app, WireOptions::new().parent(parent.clone()));

  assert!(Arc::ptr_eq(injector.parent().unwrap(), &parent));
  assert_eq!(*injector.get::<String>().unwrap(), "from parent");
}

// --- Injection into application hooks ---

#[tokio::test]
async fn test_it_should_inject_into_app_views() {
  let app = App::new("wire");
  app
    .route("/", |Inject(greeting): Inject<String>| async move {
      format!("{} from the view", greeting)
    })
    .unwrap();
  wire(
    &app,
    WireOptions::new().module(|binder: &Binder| binder.add_instance(String::from("Hello"))),
  );

  let response = app.test_client().get("/").await;

  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(response.body(), "Hello from the view");
}

#[tokio::test]
async fn test_it_should_inject_into_app_before_request_function() {
  let app = factory();
  let seen = Seen::default();
  app.before_request(recorder(&seen));
  wire(&app, WireOptions::new().module(configure));

  let response = app.test_client().get("/").await;

  assert_eq!(response.body(), "content here");
  assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_it_should_inject_into_app_after_request_function() {
  let app = factory();
  let seen = Seen::default();
  let record = seen.clone();
  app.after_request(
    move |CurrentResponse(response): CurrentResponse, Inject(empty): Inject<EmptyClass>| {
      let record = record.clone();
      async move {
        record.lock().push(empty);
        response
      }
    },
  );
  wire(&app, WireOptions::new().module(configure));

  let response = app.test_client().get("/").await;

  assert_eq!(response.body(), "content here");
  assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_it_should_inject_into_app_teardown_request_function() {
  let app = factory();
  let seen = Seen::default();
  app.teardown_request(recorder(&seen));
  wire(&app, WireOptions::new().module(configure));

  app.test_client().get("/").await;

  assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_it_should_inject_into_app_before_websocket_function() {
  let app = factory();
  let seen = Seen::default();
  app.before_websocket(recorder(&seen));
  wire(&app, WireOptions::new().module(configure));

  echo_over_websocket(&app).await;

  assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_it_should_inject_into_app_after_websocket_function() {
  let app = factory();
  let seen = Seen::default();
  let record = seen.clone();
  app.after_websocket(
    move |response: Option<CurrentResponse>, Inject(empty): Inject<EmptyClass>| {
      let record = record.clone();
      async move {
        record.lock().push(empty);
        response.map(|CurrentResponse(response)| response)
      }
    },
  );
  wire(&app, WireOptions::new().module(configure));

  echo_over_websocket(&app).await;

  assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_it_should_inject_into_app_teardown_websocket_function() {
  let app = factory();
  let seen = Seen::default();
  app.teardown_websocket(recorder(&seen));
  wire(&app, WireOptions::new().module(configure));

  echo_over_websocket(&app).await;

  assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_it_should_inject_into_app_errorhandler_function() {
  let app = factory();
  let seen = Seen::default();
  let record = seen.clone();
  app.errorhandler::<CustomError, _, _>(
    move |Failure(failure): Failure, Inject(empty): Inject<EmptyClass>| {
      let record = record.clone();
      async move {
        record.lock().push(empty);
        let failure = failure.map(|f| f.to_string()).unwrap_or_default();
        (StatusCode::IM_A_TEAPOT, format!("handled {}", failure))
      }
    },
  );
  wire(&app, WireOptions::new().module(configure));

  let response = app.test_client().get("/error").await;

  assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
  assert_eq!(response.body(), "handled custom error");
  assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_it_should_inject_into_app_context_processor_function() {
  let app = factory();
  let seen = Seen::default();
  let record = seen.clone();
  app.context_processor(move |Inject(empty): Inject<EmptyClass>| {
    let record = record.clone();
    async move {
      record.lock().push(empty);
      vec![("extra", "from processor")]
    }
  });
  wire(&app, WireOptions::new().module(configure));

  let plain = app.test_client().get("/template").await;
  let processed = app.test_client().get("/processed").await;

  assert_eq!(plain.body(), "content here");
  assert_eq!(processed.body(), "content here from processor");
  assert_eq!(seen.lock().len(), 2);
}

#[tokio::test]
async fn test_hooks_registered_after_wiring_are_injected_too() {
  let app = factory();
  wire(&app, WireOptions::new().module(configure));

  let seen = Seen::default();
  app.before_request(recorder(&seen));
  app.teardown_request(recorder(&seen));

  app.test_client().get("/").await;

  let seen = seen.lock();
  assert_eq!(seen.len(), 2);
  assert!(Arc::ptr_eq(&seen[0], &seen[1]));
}

#[tokio::test]
async fn test_unhandled_errors_become_internal_server_errors() {
  let app = factory();
  wire(&app, WireOptions::new().module(configure));

  let response = app.test_client().get("/error").await;

  assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_missing_dependencies_surface_as_handler_errors() {
  struct Unbound;

  let app = App::new("wire");
  app
    .route("/", |_: Inject<Unbound>| async { "unreachable" })
    .unwrap();
  let failures = Arc::new(Mutex::new(Vec::new()));
  let record = failures.clone();
  app.teardown_request(move |Failure(failure): Failure| {
    let record = record.clone();
    async move {
      record.lock().extend(failure);
    }
  });
  wire(&app, WireOptions::new().auto_bind(false));

  let response = app.test_client().get("/").await;

  assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let failures = failures.lock();
  assert_eq!(failures.len(), 1);
  assert!(matches!(
    failures[0].downcast_ref::<Error>(),
    Some(Error::Inject(InjectError::UnsatisfiedRequirement { .. }))
  ));
}

#[tokio::test]
async fn test_views_fail_without_a_wired_container() {
  let app = App::new("bare");
  app
    .route("/", |_: Inject<EmptyClass>| async { Response::ok("unreachable") })
    .unwrap();

  let response = app.test_client().get("/").await;

  assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
