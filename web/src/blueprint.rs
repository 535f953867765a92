use crate::error::Result;
use crate::handler::{erase_hook, Handler};
use crate::hooks::{hook_registration, Hooks};
use crate::response::{MaybeResponse, Responder};
use crate::routing::{Rule, Target};
use crate::view::IntoView;

use parking_lot::Mutex;
use std::fmt;

pub(crate) struct BlueprintParts {
  pub(crate) name: String,
  pub(crate) url_prefix: String,
  pub(crate) hooks: Hooks,
  pub(crate) routes: Vec<(Rule, Option<Target>)>,
}

/// A group of routes and hooks mounted on an [`App`](crate::App).
///
/// Blueprint hooks only run for requests routed to one of its rules: before
/// hooks after the app's, after and teardown hooks before the app's.
/// Endpoints are prefixed with the blueprint name (`name.endpoint`).
pub struct Blueprint {
  name: String,
  url_prefix: String,
  hooks: Mutex<Hooks>,
  routes: Mutex<Vec<(Rule, Option<Target>)>>,
}

impl Blueprint {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      url_prefix: String::new(),
      hooks: Mutex::new(Hooks::default()),
      routes: Mutex::new(Vec::new()),
    }
  }

  pub fn with_url_prefix(mut self, url_prefix: impl Into<String>) -> Self {
    self.url_prefix = url_prefix.into();
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn url_prefix(&self) -> &str {
    &self.url_prefix
  }

  pub(crate) fn with_hooks(&self, f: impl FnOnce(&mut Hooks)) {
    f(&mut self.hooks.lock());
  }

  hook_registration!("blueprint");

  pub fn route<H, Args>(&self, path: &str, handler: H) -> Result<()>
  where
    H: Handler<Args>,
    H::Output: Responder,
  {
    self.add_url_rule(Rule::new(path), handler)
  }

  pub fn add_url_rule<M>(&self, rule: Rule, view: impl IntoView<M>) -> Result<()> {
    let view = view.into_view()?;
    self.routes.lock().push((rule, Some(Target::View(view))));
    Ok(())
  }

  pub fn add_rule(&self, rule: Rule) {
    self.routes.lock().push((rule, None));
  }

  pub fn websocket<H, Args>(&self, path: &str, handler: H)
  where
    H: Handler<Args>,
    H::Output: MaybeResponse,
  {
    let hook = erase_hook(handler, <H::Output as MaybeResponse>::maybe_respond);
    self
      .routes
      .lock()
      .push((Rule::new(path), Some(Target::Websocket(hook))));
  }

  pub(crate) fn into_parts(self) -> BlueprintParts {
    BlueprintParts {
      name: self.name,
      url_prefix: self.url_prefix,
      hooks: self.hooks.into_inner(),
      routes: self.routes.into_inner(),
    }
  }
}

impl fmt::Debug for Blueprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Blueprint")
      .field("name", &self.name)
      .field("url_prefix", &self.url_prefix)
      .finish()
  }
}
