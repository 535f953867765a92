use crate::app::App;
use crate::context::{Request, Session, Websocket};
use crate::error::{Error, Result};
use crate::response::Response;

use http::Method;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Drives an [`App`] in-process, keeping one session across its requests.
#[derive(Debug, Clone)]
pub struct TestClient {
  app: App,
  session: Arc<Session>,
}

impl TestClient {
  pub fn new(app: App) -> Self {
    Self {
      app,
      session: Arc::new(Session::new()),
    }
  }

  pub fn session(&self) -> &Arc<Session> {
    &self.session
  }

  pub async fn get(&self, target: &str) -> Response {
    self.request(Request::new(Method::GET, target)).await
  }

  pub async fn post(&self, target: &str, body: impl Into<String>) -> Response {
    self
      .request(Request::new(Method::POST, target).with_body(body))
      .await
  }

  pub async fn request(&self, request: Request) -> Response {
    self.app.handle_request(request, self.session.clone()).await
  }

  /// Opens a websocket connection to `path`. The handler runs on its own task
  /// until it returns.
  pub fn websocket(&self, path: &str) -> WebsocketConnection {
    let (to_server, incoming) = mpsc::unbounded_channel();
    let (outgoing, from_server) = mpsc::unbounded_channel();
    let websocket = Arc::new(Websocket::new(path, incoming, outgoing));

    let app = self.app.clone();
    let session = self.session.clone();
    let handle = tokio::spawn(async move { app.handle_websocket(websocket, session).await });

    WebsocketConnection {
      to_server: Some(to_server),
      from_server,
      handle,
    }
  }
}

/// Client side of a websocket opened by [`TestClient::websocket`].
#[derive(Debug)]
pub struct WebsocketConnection {
  to_server: Option<mpsc::UnboundedSender<String>>,
  from_server: mpsc::UnboundedReceiver<String>,
  handle: JoinHandle<Option<Response>>,
}

impl WebsocketConnection {
  pub fn send(&self, message: impl Into<String>) -> Result<()> {
    self
      .to_server
      .as_ref()
      .ok_or(Error::WebsocketClosed)?
      .send(message.into())
      .map_err(|_| Error::WebsocketClosed)
  }

  /// Waits for the next message sent by the handler.
  pub async fn receive(&mut self) -> Result<String> {
    self.from_server.recv().await.ok_or(Error::WebsocketClosed)
  }

  /// Closes the client side and waits for the handler and its hooks to
  /// finish. Returns the response they produced, if any.
  pub async fn close(mut self) -> Option<Response> {
    self.to_server.take();
    self.handle.await.ok().flatten()
  }
}
