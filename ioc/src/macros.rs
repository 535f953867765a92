//! Public macros for ergonomic service resolution.

/// Resolves a bound service from an injector, panicking if it is missing.
///
/// Prefer [`Injector::get`](crate::Injector::get) and `?` inside factories;
/// this macro is meant for wiring code and tests where a missing binding is a
/// programming error.
///
/// # Panics
///
/// Panics with the resolution error if the service cannot be produced.
///
/// # Examples
///
/// ```
/// use fibre_inject::{resolve_from, Binder, Injector};
///
/// let injector = Injector::builder()
///   .module(|binder: &Binder| binder.add_instance(String::from("hello")))
///   .build();
///
/// let message = resolve_from!(injector, String);
/// assert_eq!(*message, "hello");
/// ```
#[macro_export]
macro_rules! resolve_from {
  // resolve_from!(injector, trait MyTrait)
  ($injector:expr, trait $trait_ident:ident) => {
    $injector
      .get::<dyn $trait_ident>()
      .unwrap_or_else(|err| panic!("Failed to resolve required trait service: {}", err))
  };

  // resolve_from!(injector, trait MyTrait, "name")
  ($injector:expr, trait $trait_ident:ident, $name:expr) => {
    $injector
      .get_named::<dyn $trait_ident>($name)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required trait service with name '{}': {}",
          $name, err
        )
      })
  };

  // resolve_from!(injector, MyService)
  ($injector:expr, $type:ty) => {
    $injector
      .get::<$type>()
      .unwrap_or_else(|err| panic!("Failed to resolve required service: {}", err))
  };

  // resolve_from!(injector, MyService, "name")
  ($injector:expr, $type:ty, $name:expr) => {
    $injector
      .get_named::<$type>($name)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required service with name '{}': {}",
          $name, err
        )
      })
  };
}

/// Resolves a bound service from an injector, returning `None` if it cannot be
/// produced.
#[macro_export]
macro_rules! maybe_resolve_from {
  ($injector:expr, trait $trait_ident:ident) => {
    $injector.try_get::<dyn $trait_ident>(None)
  };

  ($injector:expr, trait $trait_ident:ident, $name:expr) => {
    $injector.try_get::<dyn $trait_ident>(Some($name))
  };

  ($injector:expr, $type:ty) => {
    $injector.try_get::<$type>(None)
  };

  ($injector:expr, $type:ty, $name:expr) => {
    $injector.try_get::<$type>(Some($name))
  };
}
