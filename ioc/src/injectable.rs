use crate::error::Result;
use crate::injector::Injector;
use crate::scope::Lifetime;
use std::any::Any;

/// A type the container knows how to build from its own dependencies.
///
/// Implementing this trait is what makes a type eligible for auto-binding: an
/// injector created with `auto_bind(true)` constructs it on first use even when
/// no module registered it. `LIFETIME` plays the role of a scope annotation on
/// the type itself.
///
/// ```
/// use fibre_inject::{Injectable, Injector, Lifetime, Result};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// struct Audit {
///   clock: Arc<Clock>,
/// }
///
/// impl Injectable for Clock {
///   const LIFETIME: Lifetime = Lifetime::Singleton;
///   fn construct(_: &Injector) -> Result<Self> {
///     Ok(Clock)
///   }
/// }
///
/// impl Injectable for Audit {
///   fn construct(injector: &Injector) -> Result<Self> {
///     Ok(Audit { clock: injector.resolve()? })
///   }
/// }
///
/// let injector = Injector::builder().build();
/// let a = injector.resolve::<Audit>().unwrap();
/// let b = injector.resolve::<Audit>().unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&a.clock, &b.clock));
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
  /// Lifetime used when the type is bound without an explicit one.
  const LIFETIME: Lifetime = Lifetime::Transient;

  fn construct(injector: &Injector) -> Result<Self>;
}
