use crate::app::App;
use crate::context::{Params, RequestContext};
use crate::error::{HandlerError, Result};
use crate::module::AppModule;
use crate::response::Response;
use crate::scope::bind_scope;
use crate::view::{IntoView, ViewFn, ViewMeta};

use fibre_inject::{local_stack, Injector, Module};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The extension key the container is attached to the app under.
pub const INJECTOR_EXTENSION: &str = "injector";

/// How [`wire`] builds the application's container.
pub struct WireOptions {
  modules: Vec<Box<dyn Module>>,
  auto_bind: bool,
  parent: Option<Arc<Injector>>,
}

impl Default for WireOptions {
  fn default() -> Self {
    Self {
      modules: Vec::new(),
      auto_bind: true,
      parent: None,
    }
  }
}

impl WireOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a configuration module. Modules run in the order they are added,
  /// after the default bindings.
  pub fn module(mut self, module: impl Module + 'static) -> Self {
    self.modules.push(Box::new(module));
    self
  }

  /// Whether unbound `Injectable` types are bound on first resolution.
  /// Defaults to `true`.
  pub fn auto_bind(mut self, auto_bind: bool) -> Self {
    self.auto_bind = auto_bind;
    self
  }

  pub fn parent(mut self, parent: Arc<Injector>) -> Self {
    self.parent = Some(parent);
    self
  }
}

impl fmt::Debug for WireOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WireOptions")
      .field("modules", &self.modules.len())
      .field("auto_bind", &self.auto_bind)
      .field("parent", &self.parent.is_some())
      .finish()
  }
}

/// Sets up dependency injection for `app`.
///
/// Builds a container from the default [`AppModule`] followed by the
/// configured modules, attaches it to the app under [`INJECTOR_EXTENSION`]
/// and installs the request scope hooks. From then on every handler and hook
/// of the app, registered before or after this call, resolves its
/// dependencies from the returned container.
pub fn wire(app: &App, options: WireOptions) -> Arc<Injector> {
  let mut builder = Injector::builder()
    .module(AppModule::new(app))
    .modules(options.modules)
    .auto_bind(options.auto_bind);
  if let Some(parent) = options.parent {
    builder = builder.parent(parent);
  }
  let injector = builder.build();

  app.set_extension(INJECTOR_EXTENSION, injector.clone());
  bind_scope(app, &injector);
  info!(app = %app.name(), auto_bind = injector.is_auto_bind(), "wired dependency injection");
  injector
}

/// Wraps `view` so its dependencies come from `injector`, whatever container
/// the app it is called for carries.
///
/// Fails without side effects when the view cannot be wrapped, e.g. a
/// class-based view given positional arguments.
pub fn wrap<M>(view: impl IntoView<M>, app: &App, injector: &Arc<Injector>) -> Result<Wrapped> {
  Ok(Wrapped {
    view: view.into_view()?,
    app: app.clone(),
    injector: injector.clone(),
  })
}

/// A view bound to a container.
///
/// Callable directly with [`call`](Wrapped::call), or registered as a route
/// view like any other.
#[derive(Clone)]
pub struct Wrapped {
  view: ViewFn,
  app: App,
  injector: Arc<Injector>,
}

impl Wrapped {
  pub fn meta(&self) -> &ViewMeta {
    self.view.meta()
  }

  pub fn injector(&self) -> &Arc<Injector> {
    &self.injector
  }

  /// Calls the view outside of any request, with `params` as its arguments.
  ///
  /// The call runs in a request scope of its own.
  pub async fn call<I, K, V>(&self, params: I) -> Result<Response, HandlerError>
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let params: Params = params.into_iter().collect();
    let ctx = RequestContext::detached(self.app.clone(), self.injector.clone(), params);
    let view = self.view.clone();
    let scope = self.injector.request_scope().clone();

    local_stack::isolate(async move {
      scope.push();
      scope.provide(ctx.session().clone())?;
      let result = view.call(ctx).await;
      scope.pop()?;
      result
    })
    .await
  }
}

impl fmt::Debug for Wrapped {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Wrapped")
      .field("view", self.view.meta())
      .field("app", &self.app.name())
      .finish()
  }
}

#[doc(hidden)]
pub struct WrappedView;

impl IntoView<WrappedView> for Wrapped {
  fn into_view(self) -> Result<ViewFn> {
    let injector = self.injector;
    Ok(self.view.around(move |ctx, inner| {
      let ctx = ctx.with_injector(injector.clone());
      async move { inner.call(ctx).await }
    }))
  }
}
