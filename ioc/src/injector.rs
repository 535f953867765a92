//! The main `Injector` struct and its associated methods.

use crate::binder::{Binder, Module};
use crate::core::{downcast, erase, InjectionKey, Provider, ResolutionGuard};
use crate::error::{Error, Result};
use crate::injectable::Injectable;
use crate::scope::{Lifetime, RequestScope};
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The dependency injection container.
///
/// Holds the bindings registered by its modules, resolves services on demand
/// and owns the [`RequestScope`] used by request-scoped bindings. Injectors can
/// be chained: lookups that miss fall through to the parent.
pub struct Injector {
  providers: DashMap<InjectionKey, Arc<Provider>>,
  auto_bind: bool,
  parent: Option<Arc<Injector>>,
  request_scope: RequestScope,
}

impl Injector {
  /// Starts building a new injector.
  pub fn builder() -> InjectorBuilder {
    InjectorBuilder::default()
  }

  /// Creates a new, empty injector with auto-binding enabled.
  pub fn new() -> Arc<Self> {
    Self::builder().build()
  }

  /// Returns a binder for registering further bindings at runtime.
  pub fn binder(&self) -> Binder<'_> {
    Binder::new(self)
  }

  /// Runs `module` against this injector.
  pub fn install(&self, module: &dyn Module) {
    module.configure(&self.binder());
  }

  pub fn parent(&self) -> Option<&Arc<Injector>> {
    self.parent.as_ref()
  }

  pub fn is_auto_bind(&self) -> bool {
    self.auto_bind
  }

  pub fn request_scope(&self) -> &RequestScope {
    &self.request_scope
  }

  /// Whether a binding for `T` exists here or in a parent.
  pub fn is_bound<T: ?Sized + Any>(&self) -> bool {
    self.lookup(&InjectionKey::of::<T>()).is_some()
  }

  /// The lifetime of the binding for `T`, if any.
  pub fn lifetime_of<T: ?Sized + Any>(&self) -> Option<Lifetime> {
    self
      .lookup(&InjectionKey::of::<T>())
      .map(|(_, provider)| provider.lifetime())
  }

  // --- PRIVATE HELPERS ---

  pub(crate) fn register(&self, key: InjectionKey, provider: Provider) {
    tracing::debug!(?key, lifetime = ?provider.lifetime(), "binding registered");
    self.providers.insert(key, Arc::new(provider));
  }

  fn register_if_absent(&self, key: InjectionKey, provider: Provider) {
    self
      .providers
      .entry(key)
      .or_insert_with(|| Arc::new(provider));
  }

  // The map guard is released before the provider runs: factories resolve
  // other services and auto-binding may insert into the same shard.
  fn lookup(&self, key: &InjectionKey) -> Option<(&Injector, Arc<Provider>)> {
    let local = self.providers.get(key).map(|entry| entry.value().clone());
    match local {
      Some(provider) => Some((self, provider)),
      None => self.parent.as_deref().and_then(|parent| parent.lookup(key)),
    }
  }

  fn get_by_key<T: ?Sized + Any + Send + Sync>(&self, key: InjectionKey) -> Result<Arc<T>> {
    let (owner, provider) = self.lookup(&key).ok_or(Error::UnsatisfiedRequirement {
      type_name: key.type_name(),
    })?;
    let _guard = ResolutionGuard::enter(owner, &key)?;
    tracing::trace!(?key, "resolving");
    let instance = provider.provide(&key, owner)?;
    downcast(&instance, &key)
  }

  // --- Resolution ---

  /// Resolves a bound service.
  ///
  /// Only registered bindings (here or in a parent) are considered; use
  /// [`Injector::resolve`] for types that may be auto-bound.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.get_by_key(InjectionKey::of::<T>())
  }

  /// Resolves a service registered under `name`.
  pub fn get_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.get_by_key(InjectionKey::named::<T>(name))
  }

  /// Resolves a service, returning `None` when it cannot be produced.
  pub fn try_get<T: ?Sized + Any + Send + Sync>(&self, name: Option<&str>) -> Option<Arc<T>> {
    self
      .get_by_key(InjectionKey::with_optional_name::<T>(name))
      .ok()
  }

  /// Resolves an injectable service, binding it on first use when auto-binding
  /// is enabled.
  pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>> {
    let key = InjectionKey::of::<T>();
    if self.lookup(&key).is_none() {
      if !self.auto_bind {
        return Err(Error::UnsatisfiedRequirement {
          type_name: key.type_name(),
        });
      }
      tracing::debug!(?key, lifetime = ?T::LIFETIME, "auto-binding");
      let provider = Provider::new(
        T::LIFETIME,
        Box::new(|injector: &Injector| T::construct(injector).map(|value| erase(Arc::new(value)))),
      );
      self.register_if_absent(key.clone(), provider);
    }
    self.get_by_key(key)
  }

  /// Constructs a fresh `T`, bypassing bindings and lifetimes for `T` itself.
  /// Its dependencies are still resolved through the container.
  pub fn create<T: Injectable>(&self) -> Result<T> {
    let key = InjectionKey::of::<T>();
    let _guard = ResolutionGuard::enter(self, &key)?;
    T::construct(self)
  }
}

impl fmt::Debug for Injector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Injector")
      .field("bindings", &self.providers.len())
      .field("auto_bind", &self.auto_bind)
      .field("has_parent", &self.parent.is_some())
      .finish()
  }
}

/// Builder for [`Injector`].
pub struct InjectorBuilder {
  modules: Vec<Box<dyn Module>>,
  auto_bind: bool,
  parent: Option<Arc<Injector>>,
}

impl Default for InjectorBuilder {
  fn default() -> Self {
    Self {
      modules: Vec::new(),
      auto_bind: true,
      parent: None,
    }
  }
}

impl InjectorBuilder {
  /// Adds a configuration module. Modules run in the order they were added.
  pub fn module(mut self, module: impl Module + 'static) -> Self {
    self.modules.push(Box::new(module));
    self
  }

  pub fn modules(mut self, modules: impl IntoIterator<Item = Box<dyn Module>>) -> Self {
    self.modules.extend(modules);
    self
  }

  /// Whether unregistered injectable types are bound on demand. Defaults to `true`.
  pub fn auto_bind(mut self, auto_bind: bool) -> Self {
    self.auto_bind = auto_bind;
    self
  }

  /// Falls back to `parent` for bindings this injector does not have.
  pub fn parent(mut self, parent: Arc<Injector>) -> Self {
    self.parent = Some(parent);
    self
  }

  pub fn build(self) -> Arc<Injector> {
    // Children share the parent's scope stack so one pushed frame covers the
    // whole hierarchy.
    let request_scope = self
      .parent
      .as_ref()
      .map(|parent| parent.request_scope.clone())
      .unwrap_or_default();

    let injector = Arc::new(Injector {
      providers: DashMap::new(),
      auto_bind: self.auto_bind,
      parent: self.parent,
      request_scope,
    });

    for module in &self.modules {
      injector.install(module.as_ref());
    }
    injector
  }
}
