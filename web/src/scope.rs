//! Ties the container's request scope to the application lifecycle.

use crate::app::App;
use crate::context::RequestContext;
use crate::error::{HandlerError, Result};
use crate::handler::BoxedHook;
use crate::response::Response;

use fibre_inject::Injector;
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// Installs the hooks that open and close a request scope on `injector` for
/// every request and websocket connection of `app`.
///
/// The push hook is inserted first in the before lists and the pop hook first
/// in the teardown lists; teardown lists run in reverse, so every other hook
/// of the app runs inside the scope. The pop runs even when the view failed.
pub fn bind_scope(app: &App, injector: &Arc<Injector>) {
  let push = {
    let injector = injector.clone();
    let hook: BoxedHook<Option<Response>> = Arc::new(
      move |ctx: RequestContext| -> BoxFuture<'static, Result<Option<Response>, HandlerError>> {
        let entered = enter_scope(&injector, &ctx).map_err(HandlerError::from);
        Box::pin(async move { entered.map(|()| None) })
      },
    );
    hook
  };

  let pop = {
    let injector = injector.clone();
    let hook: BoxedHook<()> = Arc::new(
      move |_ctx: RequestContext| -> BoxFuture<'static, Result<(), HandlerError>> {
        let exited = injector.request_scope().pop().map_err(HandlerError::from);
        Box::pin(async move { exited })
      },
    );
    hook
  };

  app.with_hooks(|hooks| {
    hooks.before_request.insert(0, push.clone());
    hooks.before_websocket.insert(0, push);
    hooks.teardown_request.insert(0, pop.clone());
    hooks.teardown_websocket.insert(0, pop);
  });
}

/// Pushes a frame and seeds it with the values of the current connection.
fn enter_scope(injector: &Injector, ctx: &RequestContext) -> Result<()> {
  let scope = injector.request_scope();
  scope.push();
  if let Some(request) = ctx.request() {
    scope.provide(request.clone())?;
  }
  if let Some(websocket) = ctx.websocket() {
    scope.provide(websocket.clone())?;
  }
  scope.provide(ctx.session().clone())?;
  Ok(())
}
