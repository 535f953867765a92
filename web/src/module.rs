use crate::app::{App, WeakApp};
use crate::config::Config;
use crate::context::{Request, Session, Websocket};

use fibre_inject::{Binder, Error, Module};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

/// A named handle emitting `tracing` events on behalf of an application.
#[derive(Clone)]
pub struct Logger {
  name: Arc<str>,
}

impl Logger {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: Arc::from(name.into()),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn debug(&self, message: impl fmt::Display) {
    tracing::debug!(logger = %self.name, "{}", message);
  }

  pub fn info(&self, message: impl fmt::Display) {
    tracing::info!(logger = %self.name, "{}", message);
  }

  pub fn warn(&self, message: impl fmt::Display) {
    tracing::warn!(logger = %self.name, "{}", message);
  }

  pub fn error(&self, message: impl fmt::Display) {
    tracing::error!(logger = %self.name, "{}", message);
  }
}

impl fmt::Debug for Logger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Logger").field("name", &self.name).finish()
  }
}

fn unavailable<T>(reason: &str) -> Error {
  Error::Unavailable {
    type_name: type_name::<T>(),
    reason: reason.to_string(),
  }
}

/// The default bindings of a wired application.
///
/// - [`App`]: the application itself.
/// - [`Config`]: its configuration.
/// - [`Logger`]: its logger.
/// - [`Request`], [`Websocket`], [`Session`]: scoped to the request and
///   seeded by the scope hooks when it starts. Resolving a `Request` or a
///   `Websocket` where none exists is an [`Error::Unavailable`].
///
/// `wire` installs this module before any user module, so user modules can
/// override every binding.
pub struct AppModule {
  app: WeakApp,
  config: Config,
  logger: Logger,
}

impl AppModule {
  pub fn new(app: &App) -> Self {
    Self {
      app: app.downgrade(),
      config: app.config().clone(),
      logger: app.logger().clone(),
    }
  }
}

impl Module for AppModule {
  fn configure(&self, binder: &Binder<'_>) {
    // A weak handle keeps the container stored in the app from owning it.
    let app = self.app.clone();
    binder.add_transient(move |_| {
      app
        .upgrade()
        .ok_or_else(|| unavailable::<App>("the application has been dropped"))
    });
    binder.add_instance(self.config.clone());
    binder.add_instance(self.logger.clone());

    binder.add_request_scoped::<Request>(|_| {
      Err(unavailable::<Request>("working outside of request context"))
    });
    binder.add_request_scoped::<Websocket>(|_| {
      Err(unavailable::<Websocket>("working outside of websocket context"))
    });
    binder.add_request_scoped::<Session>(|_| Ok(Session::new()));
  }
}
