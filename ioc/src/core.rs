//! Core, non-public data structures for the container.

use crate::error::{Error, Result};
use crate::injector::Injector;
use crate::scope::Lifetime;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type-erased service instance.
///
/// The boxed value is always an `Arc<T>` for the registered `T`, which lets the
/// same storage hold trait objects (`Arc<dyn Trait>`) and sized types alike.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory = Box<dyn Fn(&Injector) -> Result<Instance> + Send + Sync>;

thread_local! {
  // (owning injector, key) pairs being resolved on this thread. Resolution
  // never suspends, so a thread-local set is enough to spot cycles even under
  // async runtimes.
  static RESOLVING_STACK: RefCell<HashSet<(usize, InjectionKey)>> = RefCell::new(HashSet::new());
}

/// An RAII guard to detect circular dependencies.
///
/// Entering adds the binding (its owning injector plus its key) to the
/// thread-local resolution set and fails if it is already there. A child
/// binding that delegates to its parent's binding of the same key is not a
/// cycle. Dropping the guard removes the entry again.
pub(crate) struct ResolutionGuard {
  entry: (usize, InjectionKey),
}

impl ResolutionGuard {
  pub(crate) fn enter(owner: &Injector, key: &InjectionKey) -> Result<Self> {
    let entry = (owner as *const Injector as usize, key.clone());
    let inserted = RESOLVING_STACK.with(|stack| stack.borrow_mut().insert(entry.clone()));
    if !inserted {
      return Err(Error::CircularDependency {
        type_name: key.type_name,
      });
    }
    Ok(Self { entry })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.entry);
    });
  }
}

/// Identifies a binding: the bound type plus an optional registration name.
#[derive(Clone)]
pub struct InjectionKey {
  type_id: TypeId,
  type_name: &'static str,
  name: Option<Arc<str>>,
}

impl InjectionKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      name: None,
    }
  }

  pub fn named<T: ?Sized + Any>(name: &str) -> Self {
    Self {
      name: Some(Arc::from(name)),
      ..Self::of::<T>()
    }
  }

  pub(crate) fn with_optional_name<T: ?Sized + Any>(name: Option<&str>) -> Self {
    match name {
      Some(n) => Self::named::<T>(n),
      None => Self::of::<T>(),
    }
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }
}

// The type name is informational only; identity is type id plus name.
impl PartialEq for InjectionKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id && self.name == other.name
  }
}

impl Eq for InjectionKey {}

impl Hash for InjectionKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
    self.name.hash(state);
  }
}

impl fmt::Debug for InjectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "Key({}, Name({}))", self.type_name, name),
      None => write!(f, "Key({})", self.type_name),
    }
  }
}

pub(crate) enum Provider {
  Instance(Instance),
  Singleton {
    cell: OnceCell<Instance>,
    factory: Factory,
  },
  Transient {
    factory: Factory,
  },
  Request {
    factory: Factory,
  },
}

impl Provider {
  pub(crate) fn new(lifetime: Lifetime, factory: Factory) -> Self {
    match lifetime {
      Lifetime::Transient => Provider::Transient { factory },
      Lifetime::Singleton => Provider::Singleton {
        cell: OnceCell::new(),
        factory,
      },
      Lifetime::Request => Provider::Request { factory },
    }
  }

  pub(crate) fn lifetime(&self) -> Lifetime {
    match self {
      Provider::Instance(_) | Provider::Singleton { .. } => Lifetime::Singleton,
      Provider::Transient { .. } => Lifetime::Transient,
      Provider::Request { .. } => Lifetime::Request,
    }
  }

  /// Produces an instance. `owner` is the injector the binding was registered
  /// in; factories always run against it.
  pub(crate) fn provide(&self, key: &InjectionKey, owner: &Injector) -> Result<Instance> {
    match self {
      Provider::Instance(instance) => Ok(instance.clone()),
      Provider::Singleton { cell, factory } => cell.get_or_try_init(|| factory(owner)).cloned(),
      Provider::Transient { factory } => factory(owner),
      Provider::Request { factory } => owner.request_scope().get(key, || factory(owner)),
    }
  }
}

pub(crate) fn erase<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Instance {
  Arc::new(value)
}

pub(crate) fn downcast<T: ?Sized + Any + Send + Sync>(
  instance: &Instance,
  key: &InjectionKey,
) -> Result<Arc<T>> {
  instance
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or(Error::TypeMismatch {
      type_name: key.type_name,
    })
}
