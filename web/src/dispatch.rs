//! Request and websocket dispatch: routing, lifecycle hooks, error handling.
//!
//! Every dispatch runs as its own logical task (`local_stack::isolate`), so
//! scope frames pushed by its hooks are private to it.

use crate::app::App;
use crate::context::{Connection, Params, Request, RequestContext, Session, Websocket};
use crate::error::{HandlerError, HttpError};
use crate::hooks::{Hooks, Lifecycle};
use crate::response::Response;
use crate::routing::Target;

use fibre_inject::local_stack;
use http::Method;
use std::sync::Arc;
use tracing::{debug, error, warn};

impl App {
  /// Dispatches `request` through the hooks and the matched view.
  pub async fn handle_request(&self, request: Request, session: Arc<Session>) -> Response {
    let method = request.method().clone();
    let path = request.path().to_string();
    let connection = Connection::Http(Arc::new(request));
    local_stack::isolate(self.dispatch(Lifecycle::Request, Some(method), path, connection, session))
      .await
      .unwrap_or_else(Response::internal_server_error)
  }

  /// Dispatches a websocket connection. Returns the response produced by the
  /// handler or a hook, if any.
  pub async fn handle_websocket(
    &self,
    websocket: Arc<Websocket>,
    session: Arc<Session>,
  ) -> Option<Response> {
    let path = websocket.path().to_string();
    let connection = Connection::Websocket(websocket);
    local_stack::isolate(self.dispatch(Lifecycle::Websocket, None, path, connection, session)).await
  }

  async fn dispatch(
    &self,
    lifecycle: Lifecycle,
    method: Option<Method>,
    path: String,
    connection: Connection,
    session: Arc<Session>,
  ) -> Option<Response> {
    let (params, blueprint, target) = match self.lookup(method.as_ref(), &path) {
      Ok(matched) => {
        debug!(app = %self.name(), %path, endpoint = %matched.endpoint, "matched route");
        (matched.params, matched.blueprint, Ok(matched.target))
      }
      Err(http_error) => (Params::new(), None, Err(http_error)),
    };

    let ctx = RequestContext::new(self.clone(), connection, session, params, blueprint.clone());
    let app_hooks = self.hooks_snapshot();
    let blueprint_hooks = blueprint
      .as_deref()
      .and_then(|name| self.blueprint_hooks(name))
      .unwrap_or_default();
    // Registration order: app first, then the blueprint.
    let layers = [&app_hooks, &blueprint_hooks];

    let outcome = match run_before(lifecycle, &ctx, &layers).await {
      Ok(Some(response)) => Ok(Some(response)),
      Ok(None) => run_target(target, &ctx).await,
      Err(error) => Err(error),
    };

    let unhandled = match outcome {
      Ok(response) => {
        ctx.set_response(response);
        None
      }
      Err(error) => match handle_error(&ctx, &layers, error).await {
        Ok(response) => {
          ctx.set_response(Some(response));
          None
        }
        Err(error) => {
          error!(app = %self.name(), %path, %error, "unhandled error");
          ctx.set_response(Some(Response::internal_server_error()));
          Some(error)
        }
      },
    };

    if let Err(error) = run_after(lifecycle, &ctx, &layers).await {
      error!(app = %self.name(), %path, %error, "after hook failed");
      ctx.set_response(Some(Response::internal_server_error()));
    }

    ctx.set_failure(unhandled);
    run_teardown(lifecycle, &ctx, &layers).await;
    ctx.response()
  }
}

async fn run_before(
  lifecycle: Lifecycle,
  ctx: &RequestContext,
  layers: &[&Hooks; 2],
) -> Result<Option<Response>, HandlerError> {
  for hooks in layers {
    for hook in lifecycle.before(hooks) {
      if let Some(response) = hook(ctx.clone()).await? {
        return Ok(Some(response));
      }
    }
  }
  Ok(None)
}

async fn run_target(
  target: Result<Target, HttpError>,
  ctx: &RequestContext,
) -> Result<Option<Response>, HandlerError> {
  match target? {
    Target::View(view) => view.call(ctx.clone()).await.map(Some),
    Target::Websocket(handler) => handler(ctx.clone()).await,
  }
}

/// Error handlers of the blueprint win over the app's.
async fn handle_error(
  ctx: &RequestContext,
  layers: &[&Hooks; 2],
  error: HandlerError,
) -> Result<Response, HandlerError> {
  let handler = layers
    .iter()
    .rev()
    .find_map(|hooks| hooks.find_error_handler(&error))
    .cloned();

  match handler {
    Some(handler) => {
      debug!(error_type = handler.type_name, %error, "handling error");
      ctx.set_failure(Some(error));
      let result = (handler.hook)(ctx.clone()).await;
      ctx.set_failure(None);
      result
    }
    None => match error.downcast_ref::<HttpError>() {
      Some(http_error) => Ok(Response::new(
        http_error.status,
        http_error.description.clone(),
      )),
      None => Err(error),
    },
  }
}

/// Blueprint hooks first, each list in reverse registration order.
async fn run_after(
  lifecycle: Lifecycle,
  ctx: &RequestContext,
  layers: &[&Hooks; 2],
) -> Result<(), HandlerError> {
  for hooks in layers.iter().rev() {
    for hook in lifecycle.after(hooks).iter().rev() {
      if let Some(response) = hook(ctx.clone()).await? {
        ctx.set_response(Some(response));
      }
    }
  }
  Ok(())
}

/// Runs every teardown hook, in the same order as after hooks. A failing
/// hook does not stop the others.
async fn run_teardown(lifecycle: Lifecycle, ctx: &RequestContext, layers: &[&Hooks; 2]) {
  for hooks in layers.iter().rev() {
    for hook in lifecycle.teardown(hooks).iter().rev() {
      if let Err(error) = hook(ctx.clone()).await {
        warn!(app = %ctx.app().name(), %error, "teardown hook failed");
      }
    }
  }
}
