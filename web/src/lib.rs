//! # Fibre Inject Web
//!
//! Request-scoped dependency injection for an async web application.
//!
//! [`wire`] builds a [`fibre_inject::Injector`] for an [`App`], attaches it
//! under the `"injector"` extension and ties its request scope to the app's
//! lifecycle: a scope is pushed before any other before-request hook runs and
//! popped after every teardown hook, so request-scoped services are shared
//! within one request and never across requests, even concurrent ones.
//!
//! Handlers, hooks, error handlers and context processors are plain async
//! functions whose parameters are extractors such as [`Inject`] and
//! [`Autowired`]; registration turns them into injecting hooks.
//!
//! ```
//! use fibre_inject::Binder;
//! use fibre_inject_web::{wire, App, Inject, WireOptions};
//!
//! struct Greeting(&'static str);
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let app = App::new("demo");
//! app
//!   .route("/", |Inject(greeting): Inject<Greeting>| async move { greeting.0 })
//!   .unwrap();
//!
//! wire(
//!   &app,
//!   WireOptions::new().module(|binder: &Binder| binder.add_instance(Greeting("hello"))),
//! );
//!
//! let response = app.test_client().get("/").await;
//! assert_eq!(response.body(), "hello");
//! # });
//! ```

mod app;
mod blueprint;
mod config;
mod context;
mod dispatch;
mod error;
mod extract;
mod handler;
mod hooks;
mod module;
mod response;
mod routing;
mod scope;
mod template;
mod testing;
mod view;
mod wiring;

pub use app::{App, WeakApp};
pub use blueprint::Blueprint;
pub use config::Config;
pub use context::{Params, Request, RequestContext, Session, Websocket};
pub use error::{Error, HandlerError, HttpError, Result};
pub use extract::{Autowired, CurrentResponse, Failure, FromContext, Inject};
pub use handler::{BoxedHook, Handler};
pub use module::{AppModule, Logger};
pub use response::{MaybeResponse, Responder, Response, TemplateValues};
pub use routing::Rule;
pub use scope::bind_scope;
pub use testing::{TestClient, WebsocketConnection};
pub use view::{Decorator, IntoView, Kwargs, View, ViewBuilder, ViewFn, ViewMeta};
pub use wiring::{wire, wrap, WireOptions, Wrapped, INJECTOR_EXTENSION};

pub use http::{Method, StatusCode};
