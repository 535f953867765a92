use crate::app::App;
use crate::error::{Error, HandlerError, Result};
use crate::response::Response;
use crate::template;

use fibre_inject::Injector;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Path and keyword arguments handed to a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.get(name).map(String::as_str)
  }

  /// Like [`get`](Self::get), but a missing parameter is an error.
  pub fn require(&self, name: &str) -> Result<&str> {
    self
      .get(name)
      .ok_or_else(|| Error::MissingParam(name.to_string()))
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.0.insert(name.into(), value.into());
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Fills in every entry of `defaults` that is not already present.
  pub(crate) fn merge_defaults(&mut self, defaults: &Params) {
    for (name, value) in defaults.iter() {
      self
        .0
        .entry(name.to_string())
        .or_insert_with(|| value.to_string());
    }
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

/// An incoming HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
  method: Method,
  path: String,
  args: Params,
  headers: HeaderMap,
  body: String,
}

impl Request {
  /// Creates a request for `target`, which may carry a `?key=value` query.
  pub fn new(method: Method, target: &str) -> Self {
    let (path, query) = match target.split_once('?') {
      Some((path, query)) => (path, query),
      None => (target, ""),
    };
    let args = query
      .split('&')
      .filter(|pair| !pair.is_empty())
      .map(|pair| match pair.split_once('=') {
        Some((k, v)) => (k, v),
        None => (pair, ""),
      })
      .collect();

    Self {
      method,
      path: path.to_string(),
      args,
      headers: HeaderMap::new(),
      body: String::new(),
    }
  }

  pub fn with_body(mut self, body: impl Into<String>) -> Self {
    self.body = body.into();
    self
  }

  /// Invalid header names or values are ignored.
  pub fn with_header(mut self, name: &str, value: &str) -> Self {
    if let (Ok(name), Ok(value)) = (
      HeaderName::from_bytes(name.as_bytes()),
      HeaderValue::from_str(value),
    ) {
      self.headers.insert(name, value);
    }
    self
  }

  pub fn method(&self) -> &Method {
    &self.method
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  /// Query string arguments.
  pub fn args(&self) -> &Params {
    &self.args
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(name).and_then(|v| v.to_str().ok())
  }

  pub fn body(&self) -> &str {
    &self.body
  }
}

/// Server side of a websocket connection.
pub struct Websocket {
  path: String,
  incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
  outgoing: mpsc::UnboundedSender<String>,
}

impl Websocket {
  pub fn new(
    path: impl Into<String>,
    incoming: mpsc::UnboundedReceiver<String>,
    outgoing: mpsc::UnboundedSender<String>,
  ) -> Self {
    Self {
      path: path.into(),
      incoming: tokio::sync::Mutex::new(incoming),
      outgoing,
    }
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  /// Waits for the next message from the client.
  pub async fn receive(&self) -> Result<String> {
    self
      .incoming
      .lock()
      .await
      .recv()
      .await
      .ok_or(Error::WebsocketClosed)
  }

  pub fn send(&self, message: impl Into<String>) -> Result<()> {
    self
      .outgoing
      .send(message.into())
      .map_err(|_| Error::WebsocketClosed)
  }
}

impl fmt::Debug for Websocket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Websocket").field("path", &self.path).finish()
  }
}

/// Client session data, kept across the requests of one client.
#[derive(Debug, Default)]
pub struct Session {
  values: Mutex<HashMap<String, serde_json::Value>>,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let value = self.values.lock().get(key).cloned()?;
    serde_json::from_value(value).ok()
  }

  pub fn insert(&self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
    let key = key.into();
    let value = serde_json::to_value(value).map_err(|e| Error::InvalidKwarg {
      name: key.clone(),
      reason: e.to_string(),
    })?;
    self.values.lock().insert(key, value);
    Ok(())
  }

  pub fn remove(&self, key: &str) -> bool {
    self.values.lock().remove(key).is_some()
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.lock().contains_key(key)
  }
}

pub(crate) enum Connection {
  Http(Arc<Request>),
  Websocket(Arc<Websocket>),
  Detached,
}

struct ContextInner {
  app: App,
  connection: Connection,
  session: Arc<Session>,
  blueprint: Option<String>,
  response: Mutex<Option<Response>>,
  failure: Mutex<Option<HandlerError>>,
}

/// Everything a handler can see about the request being dispatched.
///
/// Cloning is cheap; clones share the current response and failure slots.
#[derive(Clone)]
pub struct RequestContext {
  inner: Arc<ContextInner>,
  params: Params,
  injector: Option<Arc<Injector>>,
}

impl RequestContext {
  pub(crate) fn new(
    app: App,
    connection: Connection,
    session: Arc<Session>,
    params: Params,
    blueprint: Option<String>,
  ) -> Self {
    Self {
      inner: Arc::new(ContextInner {
        app,
        connection,
        session,
        blueprint,
        response: Mutex::new(None),
        failure: Mutex::new(None),
      }),
      params,
      injector: None,
    }
  }

  /// A context for calling a view outside of any request.
  pub(crate) fn detached(app: App, injector: Arc<Injector>, params: Params) -> Self {
    Self::new(app, Connection::Detached, Arc::new(Session::new()), params, None)
      .with_injector(injector)
  }

  /// Returns a context that resolves dependencies from `injector` instead of
  /// the one attached to the app.
  pub fn with_injector(&self, injector: Arc<Injector>) -> Self {
    Self {
      inner: self.inner.clone(),
      params: self.params.clone(),
      injector: Some(injector),
    }
  }

  /// Returns a context whose view arguments include `name = value`.
  pub fn with_param(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
    let mut params = self.params.clone();
    params.insert(name, value);
    Self {
      inner: self.inner.clone(),
      params,
      injector: self.injector.clone(),
    }
  }

  pub fn app(&self) -> &App {
    &self.inner.app
  }

  /// The container dependencies are resolved from.
  pub fn injector(&self) -> Result<Arc<Injector>> {
    match &self.injector {
      Some(injector) => Ok(injector.clone()),
      None => self
        .inner
        .app
        .injector()
        .ok_or_else(|| Error::NoInjector(self.inner.app.name().to_string())),
    }
  }

  pub fn request(&self) -> Option<&Arc<Request>> {
    match &self.inner.connection {
      Connection::Http(request) => Some(request),
      _ => None,
    }
  }

  pub fn websocket(&self) -> Option<&Arc<Websocket>> {
    match &self.inner.connection {
      Connection::Websocket(websocket) => Some(websocket),
      _ => None,
    }
  }

  pub fn session(&self) -> &Arc<Session> {
    &self.inner.session
  }

  pub fn params(&self) -> &Params {
    &self.params
  }

  /// Name of the blueprint owning the matched route, if any.
  pub fn blueprint(&self) -> Option<&str> {
    self.inner.blueprint.as_deref()
  }

  /// The response produced so far, visible to after and teardown hooks.
  pub fn response(&self) -> Option<Response> {
    self.inner.response.lock().clone()
  }

  pub(crate) fn set_response(&self, response: Option<Response>) {
    *self.inner.response.lock() = response;
  }

  /// The error being handled, for error handlers and teardown hooks.
  pub fn failure(&self) -> Option<HandlerError> {
    self.inner.failure.lock().clone()
  }

  pub(crate) fn set_failure(&self, failure: Option<HandlerError>) {
    *self.inner.failure.lock() = failure;
  }

  /// Renders `template` as a Jinja template.
  ///
  /// Variables come from the app's context processors, then the blueprint's,
  /// then `values`; later sources win.
  pub async fn render_template_string<I, K, V>(
    &self,
    template: &str,
    values: I,
  ) -> Result<String, HandlerError>
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let mut variables = HashMap::new();
    for processor in self.inner.app.context_processors(self.blueprint()) {
      variables.extend(processor(self.clone()).await?);
    }
    variables.extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
    Ok(template::render(template, &variables)?)
  }
}

impl fmt::Debug for RequestContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RequestContext")
      .field("app", &self.inner.app.name())
      .field("request", &self.request().map(|r| r.path()))
      .field("websocket", &self.websocket().map(|w| w.path()))
      .field("blueprint", &self.inner.blueprint)
      .field("params", &self.params)
      .finish()
  }
}
