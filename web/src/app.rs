use crate::blueprint::Blueprint;
use crate::config::Config;
use crate::error::{Error, HttpError, Result};
use crate::handler::{erase_hook, BoxedHook, Handler};
use crate::hooks::{hook_registration, Hooks};
use crate::module::Logger;
use crate::response::{MaybeResponse, Responder};
use crate::routing::{Matched, Router, Rule, Target};
use crate::testing::TestClient;
use crate::view::IntoView;
use crate::wiring::INJECTOR_EXTENSION;

use fibre_inject::Injector;
use http::Method;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

pub(crate) struct AppInner {
  name: String,
  config: Config,
  logger: Logger,
  extensions: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
  hooks: RwLock<Hooks>,
  blueprints: RwLock<HashMap<String, Hooks>>,
  router: RwLock<Router>,
}

/// An async web application: routes, blueprints and lifecycle hooks.
///
/// `App` is a cheap handle; clones refer to the same application.
#[derive(Clone)]
pub struct App {
  inner: Arc<AppInner>,
}

/// A non-owning [`App`] handle.
#[derive(Clone)]
pub struct WeakApp {
  inner: Weak<AppInner>,
}

impl WeakApp {
  pub fn upgrade(&self) -> Option<App> {
    self.inner.upgrade().map(|inner| App { inner })
  }
}

impl App {
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_config(name, Config::new())
  }

  pub fn with_config(name: impl Into<String>, config: Config) -> Self {
    let name = name.into();
    Self {
      inner: Arc::new(AppInner {
        logger: Logger::new(name.clone()),
        name,
        config,
        extensions: RwLock::new(HashMap::new()),
        hooks: RwLock::new(Hooks::default()),
        blueprints: RwLock::new(HashMap::new()),
        router: RwLock::new(Router::default()),
      }),
    }
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn config(&self) -> &Config {
    &self.inner.config
  }

  pub fn logger(&self) -> &Logger {
    &self.inner.logger
  }

  pub fn downgrade(&self) -> WeakApp {
    WeakApp {
      inner: Arc::downgrade(&self.inner),
    }
  }

  /// Whether both handles refer to the same application.
  pub fn ptr_eq(&self, other: &App) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  // --- Extensions ---

  /// Attaches `value` under `key`, replacing any previous value.
  pub fn set_extension<T: Any + Send + Sync>(&self, key: impl Into<String>, value: Arc<T>) {
    self.inner.extensions.write().insert(key.into(), value);
  }

  pub fn extension<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
    let value = self.inner.extensions.read().get(key)?.clone();
    value.downcast::<T>().ok()
  }

  /// The container attached by `wire`, if any.
  pub fn injector(&self) -> Option<Arc<Injector>> {
    self.extension::<Injector>(INJECTOR_EXTENSION)
  }

  // --- Hooks ---

  pub(crate) fn with_hooks(&self, f: impl FnOnce(&mut Hooks)) {
    f(&mut self.inner.hooks.write());
  }

  hook_registration!("application");

  pub(crate) fn hooks_snapshot(&self) -> Hooks {
    self.inner.hooks.read().clone()
  }

  pub(crate) fn blueprint_hooks(&self, name: &str) -> Option<Hooks> {
    self.inner.blueprints.read().get(name).cloned()
  }

  /// Context processors for a template rendered under `blueprint`, app first.
  pub(crate) fn context_processors(
    &self,
    blueprint: Option<&str>,
  ) -> Vec<BoxedHook<HashMap<String, String>>> {
    let mut processors = self.inner.hooks.read().context_processors.clone();
    if let Some(hooks) = blueprint.and_then(|name| self.blueprint_hooks(name)) {
      processors.extend(hooks.context_processors);
    }
    processors
  }

  // --- Routing ---

  /// Routes `path` to a function view.
  pub fn route<H, Args>(&self, path: &str, handler: H) -> Result<()>
  where
    H: Handler<Args>,
    H::Output: Responder,
  {
    self.add_url_rule(Rule::new(path), handler)
  }

  /// Routes `rule` to `view`: a function, a class-based `ViewBuilder`, or an
  /// already wrapped view.
  pub fn add_url_rule<M>(&self, rule: Rule, view: impl IntoView<M>) -> Result<()> {
    let view = view.into_view()?;
    let endpoint = self
      .inner
      .router
      .write()
      .add(rule, Some(Target::View(view)), None)?;
    debug!(app = %self.inner.name, %endpoint, "registered view");
    Ok(())
  }

  /// Adds another rule for an already registered endpoint.
  pub fn add_rule(&self, rule: Rule) -> Result<()> {
    self.inner.router.write().add(rule, None, None)?;
    Ok(())
  }

  /// Routes websocket connections on `path` to `handler`.
  pub fn websocket<H, Args>(&self, path: &str, handler: H) -> Result<()>
  where
    H: Handler<Args>,
    H::Output: MaybeResponse,
  {
    let hook = erase_hook(handler, <H::Output as MaybeResponse>::maybe_respond);
    let endpoint = self
      .inner
      .router
      .write()
      .add(Rule::new(path), Some(Target::Websocket(hook)), None)?;
    debug!(app = %self.inner.name, %endpoint, "registered websocket");
    Ok(())
  }

  /// Mounts `blueprint`: its routes under its url prefix, its hooks for
  /// requests routed to it.
  pub fn register_blueprint(&self, blueprint: Blueprint) -> Result<()> {
    let parts = blueprint.into_parts();
    let mut blueprints = self.inner.blueprints.write();
    if blueprints.contains_key(&parts.name) {
      return Err(Error::DuplicateBlueprint(parts.name));
    }

    // All rules go into a copy first; the live table only changes when every
    // one of them was accepted.
    {
      let mut router = self.inner.router.write();
      let mut staged = router.clone();
      for (rule, target) in parts.routes {
        let rule = rule.with_prefix(&parts.url_prefix, &parts.name);
        staged.add(rule, target, Some(parts.name.clone()))?;
      }
      *router = staged;
    }

    debug!(
      app = %self.inner.name,
      blueprint = %parts.name,
      hooks = parts.hooks.len(),
      "registered blueprint"
    );
    blueprints.insert(parts.name, parts.hooks);
    Ok(())
  }

  /// `(path, endpoint)` of every registered rule, in registration order.
  pub fn url_rules(&self) -> Vec<(String, String)> {
    self
      .inner
      .router
      .read()
      .paths()
      .map(|(path, endpoint)| (path.to_string(), endpoint.to_string()))
      .collect()
  }

  pub(crate) fn lookup(
    &self,
    method: Option<&Method>,
    path: &str,
  ) -> std::result::Result<Matched, HttpError> {
    self.inner.router.read().lookup(method, path)
  }

  pub fn test_client(&self) -> TestClient {
    TestClient::new(self.clone())
  }
}

impl fmt::Debug for App {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("App")
      .field("name", &self.inner.name)
      .field("extensions", &self.inner.extensions.read().keys().collect::<Vec<_>>())
      .finish()
  }
}
