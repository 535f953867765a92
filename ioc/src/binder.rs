//! Registration of bindings.

use crate::core::{erase, InjectionKey, Provider};
use crate::error::Result;
use crate::injectable::Injectable;
use crate::injector::Injector;
use crate::scope::Lifetime;
use std::any::Any;
use std::sync::Arc;

/// A unit of configuration that registers bindings on an injector.
///
/// Any `Fn(&Binder)` is a module, so plain functions can be passed wherever a
/// module is expected.
pub trait Module {
  fn configure(&self, binder: &Binder<'_>);
}

impl<F> Module for F
where
  F: Fn(&Binder<'_>),
{
  fn configure(&self, binder: &Binder<'_>) {
    self(binder)
  }
}

/// Registers bindings on an [`Injector`].
///
/// The last registration for a given type (and name) wins.
pub struct Binder<'a> {
  injector: &'a Injector,
}

impl<'a> Binder<'a> {
  pub(crate) fn new(injector: &'a Injector) -> Self {
    Self { injector }
  }

  pub fn injector(&self) -> &Injector {
    self.injector
  }

  // --- PRIVATE HELPERS ---

  fn add_instance_internal<T: Any + Send + Sync>(&self, name: Option<&str>, instance: T) {
    let key = InjectionKey::with_optional_name::<T>(name);
    self
      .injector
      .register(key, Provider::Instance(erase(Arc::new(instance))));
  }

  fn add_factory_internal<T: Any + Send + Sync>(
    &self,
    name: Option<&str>,
    lifetime: Lifetime,
    factory: impl Fn(&Injector) -> Result<T> + Send + Sync + 'static,
  ) {
    let key = InjectionKey::with_optional_name::<T>(name);
    let provider = Provider::new(
      lifetime,
      Box::new(move |injector: &Injector| factory(injector).map(|value| erase(Arc::new(value)))),
    );
    self.injector.register(key, provider);
  }

  fn add_trait_internal<I: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    lifetime: Lifetime,
    factory: impl Fn(&Injector) -> Result<Arc<I>> + Send + Sync + 'static,
  ) {
    let key = InjectionKey::with_optional_name::<I>(name);
    let provider = Provider::new(
      lifetime,
      Box::new(move |injector: &Injector| factory(injector).map(erase)),
    );
    self.injector.register(key, provider);
  }

  // --- Instance Registration ---
  pub fn add_instance<T: Any + Send + Sync>(&self, instance: T) {
    self.add_instance_internal(None, instance);
  }
  pub fn add_instance_with_name<T: Any + Send + Sync>(&self, name: &str, instance: T) {
    self.add_instance_internal(Some(name), instance);
  }

  // --- Singleton Registration ---
  pub fn add_singleton<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Injector) -> Result<T> + Send + Sync + 'static,
  ) {
    self.add_factory_internal(None, Lifetime::Singleton, factory);
  }
  pub fn add_singleton_with_name<T: Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Injector) -> Result<T> + Send + Sync + 'static,
  ) {
    self.add_factory_internal(Some(name), Lifetime::Singleton, factory);
  }

  // --- Transient Registration ---
  pub fn add_transient<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Injector) -> Result<T> + Send + Sync + 'static,
  ) {
    self.add_factory_internal(None, Lifetime::Transient, factory);
  }
  pub fn add_transient_with_name<T: Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Injector) -> Result<T> + Send + Sync + 'static,
  ) {
    self.add_factory_internal(Some(name), Lifetime::Transient, factory);
  }

  // --- Request Scope Registration ---
  pub fn add_request_scoped<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Injector) -> Result<T> + Send + Sync + 'static,
  ) {
    self.add_factory_internal(None, Lifetime::Request, factory);
  }
  pub fn add_request_scoped_with_name<T: Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Injector) -> Result<T> + Send + Sync + 'static,
  ) {
    self.add_factory_internal(Some(name), Lifetime::Request, factory);
  }

  // --- Trait Registration ---
  pub fn add_singleton_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn(&Injector) -> Result<Arc<I>> + Send + Sync + 'static,
  ) {
    self.add_trait_internal(None, Lifetime::Singleton, factory);
  }
  pub fn add_singleton_trait_with_name<I: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Injector) -> Result<Arc<I>> + Send + Sync + 'static,
  ) {
    self.add_trait_internal(Some(name), Lifetime::Singleton, factory);
  }
  pub fn add_transient_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn(&Injector) -> Result<Arc<I>> + Send + Sync + 'static,
  ) {
    self.add_trait_internal(None, Lifetime::Transient, factory);
  }
  pub fn add_request_scoped_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn(&Injector) -> Result<Arc<I>> + Send + Sync + 'static,
  ) {
    self.add_trait_internal(None, Lifetime::Request, factory);
  }

  // --- Injectable Registration ---

  /// Binds `T` to its own constructor with its declared lifetime.
  pub fn bind<T: Injectable>(&self) {
    self.bind_in::<T>(T::LIFETIME);
  }

  /// Binds `T` to its own constructor, overriding its declared lifetime.
  pub fn bind_in<T: Injectable>(&self, lifetime: Lifetime) {
    self.add_factory_internal(None, lifetime, T::construct);
  }
}
