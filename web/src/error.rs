use http::StatusCode;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for `fibre_inject_web` operations.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Inject(#[from] fibre_inject::Error),

  #[error("no injector is attached to application '{0}'; call wire() first")]
  NoInjector(String),

  #[error("cannot pass positional args to as_view() when using injection")]
  PositionalViewArgs,

  #[error("missing parameter '{0}'")]
  MissingParam(String),

  #[error("invalid keyword argument '{name}': {reason}")]
  InvalidKwarg { name: String, reason: String },

  #[error("no view registered for endpoint '{0}'")]
  UnknownEndpoint(String),

  #[error("endpoint '{0}' is already mapped to a different view")]
  DuplicateEndpoint(String),

  #[error("a blueprint named '{0}' is already registered")]
  DuplicateBlueprint(String),

  #[error("invalid url rule '{rule}': {reason}")]
  InvalidRule { rule: String, reason: String },

  #[error("no response is available yet")]
  NoResponse,

  #[error("websocket connection closed")]
  WebsocketClosed,

  #[error("configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("failed to read configuration: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("invalid configuration value for '{key}': {reason}")]
  ConfigValue { key: String, reason: String },
}

/// A specialized `Result` type for `fibre_inject_web` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An HTTP error raised by routing or by a handler, such as a 404.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {description}")]
pub struct HttpError {
  pub status: StatusCode,
  pub description: String,
}

impl HttpError {
  pub fn new(status: StatusCode, description: impl Into<String>) -> Self {
    Self {
      status,
      description: description.into(),
    }
  }

  pub fn not_found() -> Self {
    Self::new(
      StatusCode::NOT_FOUND,
      "The requested URL was not found on the server.",
    )
  }

  pub fn method_not_allowed() -> Self {
    Self::new(
      StatusCode::METHOD_NOT_ALLOWED,
      "The method is not allowed for the requested URL.",
    )
  }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl StdError for Message {}

/// Any error raised by a handler or hook.
///
/// Cheap to clone, so the same failure can be handed to error handlers and
/// teardown hooks. Error handlers are selected by the concrete type inside.
#[derive(Clone)]
pub struct HandlerError {
  inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl HandlerError {
  pub fn new<E: StdError + Send + Sync + 'static>(error: E) -> Self {
    Self {
      inner: Arc::new(error),
    }
  }

  /// An error carrying only a message.
  pub fn msg(message: impl Into<String>) -> Self {
    Self::new(Message(message.into()))
  }

  pub fn is<E: StdError + 'static>(&self) -> bool {
    self.inner.is::<E>()
  }

  pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
    self.inner.downcast_ref::<E>()
  }

  pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
    self.inner.as_ref()
  }
}

impl<E: StdError + Send + Sync + 'static> From<E> for HandlerError {
  fn from(error: E) -> Self {
    Self::new(error)
  }
}

impl fmt::Display for HandlerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.inner, f)
  }
}

impl fmt::Debug for HandlerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&self.inner, f)
  }
}
