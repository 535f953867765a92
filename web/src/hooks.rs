use crate::error::HandlerError;
use crate::handler::BoxedHook;
use crate::response::Response;

use std::collections::HashMap;

/// An error handler together with the error type it handles.
#[derive(Clone)]
pub(crate) struct ErrorHandler {
  pub(crate) matches: fn(&HandlerError) -> bool,
  pub(crate) type_name: &'static str,
  pub(crate) hook: BoxedHook<Response>,
}

/// The lifecycle hook lists of an app or blueprint, in registration order.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
  pub(crate) before_request: Vec<BoxedHook<Option<Response>>>,
  pub(crate) before_websocket: Vec<BoxedHook<Option<Response>>>,
  pub(crate) after_request: Vec<BoxedHook<Option<Response>>>,
  pub(crate) after_websocket: Vec<BoxedHook<Option<Response>>>,
  pub(crate) teardown_request: Vec<BoxedHook<()>>,
  pub(crate) teardown_websocket: Vec<BoxedHook<()>>,
  pub(crate) error_handlers: Vec<ErrorHandler>,
  pub(crate) context_processors: Vec<BoxedHook<HashMap<String, String>>>,
}

impl Hooks {
  pub(crate) fn find_error_handler(&self, error: &HandlerError) -> Option<&ErrorHandler> {
    self.error_handlers.iter().find(|h| (h.matches)(error))
  }

  pub(crate) fn len(&self) -> usize {
    self.before_request.len()
      + self.before_websocket.len()
      + self.after_request.len()
      + self.after_websocket.len()
      + self.teardown_request.len()
      + self.teardown_websocket.len()
      + self.error_handlers.len()
      + self.context_processors.len()
  }
}

/// Which lifecycle a dispatch runs, selecting the matching hook lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
  Request,
  Websocket,
}

impl Lifecycle {
  pub(crate) fn before<'h>(&self, hooks: &'h Hooks) -> &'h [BoxedHook<Option<Response>>] {
    match self {
      Lifecycle::Request => &hooks.before_request,
      Lifecycle::Websocket => &hooks.before_websocket,
    }
  }

  pub(crate) fn after<'h>(&self, hooks: &'h Hooks) -> &'h [BoxedHook<Option<Response>>] {
    match self {
      Lifecycle::Request => &hooks.after_request,
      Lifecycle::Websocket => &hooks.after_websocket,
    }
  }

  pub(crate) fn teardown<'h>(&self, hooks: &'h Hooks) -> &'h [BoxedHook<()>] {
    match self {
      Lifecycle::Request => &hooks.teardown_request,
      Lifecycle::Websocket => &hooks.teardown_websocket,
    }
  }
}

/// Generates the hook registration methods shared by `App` and `Blueprint`.
///
/// The implementing type provides `fn with_hooks(&self, f: impl FnOnce(&mut Hooks))`.
macro_rules! hook_registration {
  ($owner:literal) => {
    #[doc = concat!("Registers a hook run before each request handled by this ", $owner, ".")]
    ///
    /// Returning a response skips the view.
    pub fn before_request<H, Args>(&self, handler: H) -> &Self
    where
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::MaybeResponse,
    {
      let hook = $crate::handler::erase_hook(
        handler,
        <H::Output as $crate::response::MaybeResponse>::maybe_respond,
      );
      self.with_hooks(|hooks| hooks.before_request.push(hook));
      self
    }

    #[doc = concat!("Registers a hook run before each websocket handled by this ", $owner, ".")]
    pub fn before_websocket<H, Args>(&self, handler: H) -> &Self
    where
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::MaybeResponse,
    {
      let hook = $crate::handler::erase_hook(
        handler,
        <H::Output as $crate::response::MaybeResponse>::maybe_respond,
      );
      self.with_hooks(|hooks| hooks.before_websocket.push(hook));
      self
    }

    /// Registers a hook run after the view. After hooks run in reverse
    /// registration order and may replace the response.
    pub fn after_request<H, Args>(&self, handler: H) -> &Self
    where
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::MaybeResponse,
    {
      let hook = $crate::handler::erase_hook(
        handler,
        <H::Output as $crate::response::MaybeResponse>::maybe_respond,
      );
      self.with_hooks(|hooks| hooks.after_request.push(hook));
      self
    }

    pub fn after_websocket<H, Args>(&self, handler: H) -> &Self
    where
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::MaybeResponse,
    {
      let hook = $crate::handler::erase_hook(
        handler,
        <H::Output as $crate::response::MaybeResponse>::maybe_respond,
      );
      self.with_hooks(|hooks| hooks.after_websocket.push(hook));
      self
    }

    /// Registers a hook that always runs once the request is finished, in
    /// reverse registration order, even when the view failed.
    pub fn teardown_request<H, Args>(&self, handler: H) -> &Self
    where
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::MaybeResponse,
    {
      let hook = $crate::handler::erase_hook(handler, |output: H::Output| {
        $crate::response::MaybeResponse::maybe_respond(output).map(drop)
      });
      self.with_hooks(|hooks| hooks.teardown_request.push(hook));
      self
    }

    pub fn teardown_websocket<H, Args>(&self, handler: H) -> &Self
    where
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::MaybeResponse,
    {
      let hook = $crate::handler::erase_hook(handler, |output: H::Output| {
        $crate::response::MaybeResponse::maybe_respond(output).map(drop)
      });
      self.with_hooks(|hooks| hooks.teardown_websocket.push(hook));
      self
    }

    /// Registers a handler for errors of type `E`.
    ///
    /// The failing error is available through the `Failure` extractor.
    pub fn errorhandler<E, H, Args>(&self, handler: H) -> &Self
    where
      E: std::error::Error + Send + Sync + 'static,
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::Responder,
    {
      let entry = $crate::hooks::ErrorHandler {
        matches: |error: &$crate::error::HandlerError| error.is::<E>(),
        type_name: std::any::type_name::<E>(),
        hook: $crate::handler::erase_hook(
          handler,
          <H::Output as $crate::response::Responder>::respond,
        ),
      };
      self.with_hooks(|hooks| hooks.error_handlers.push(entry));
      self
    }

    /// Registers a function supplying variables to rendered templates.
    pub fn context_processor<H, Args>(&self, handler: H) -> &Self
    where
      H: $crate::handler::Handler<Args>,
      H::Output: $crate::response::TemplateValues,
    {
      let hook = $crate::handler::erase_hook(
        handler,
        <H::Output as $crate::response::TemplateValues>::into_values,
      );
      self.with_hooks(|hooks| hooks.context_processors.push(hook));
      self
    }
  };
}

pub(crate) use hook_registration;
