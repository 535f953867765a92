//! Handler parameter types.

use crate::context::{Params, RequestContext};
use crate::error::{Error, HandlerError, Result};
use crate::response::Response;

use fibre_inject::Injectable;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Types that can be produced from a [`RequestContext`] as handler arguments.
pub trait FromContext: Sized {
  fn from_context(ctx: &RequestContext) -> Result<Self>;
}

/// A dependency bound in the container, resolved with `Injector::get`.
///
/// Works for trait objects too: `Inject<dyn Greeter>`.
pub struct Inject<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized + Any + Send + Sync> FromContext for Inject<T> {
  fn from_context(ctx: &RequestContext) -> Result<Self> {
    Ok(Inject(ctx.injector()?.get::<T>()?))
  }
}

impl<T: ?Sized> Deref for Inject<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T: ?Sized> Clone for Inject<T> {
  fn clone(&self) -> Self {
    Inject(self.0.clone())
  }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Inject<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Inject").field(&&*self.0).finish()
  }
}

/// An [`Injectable`] dependency, bound on first use when the container
/// allows auto-binding.
pub struct Autowired<T>(pub Arc<T>);

impl<T: Injectable> FromContext for Autowired<T> {
  fn from_context(ctx: &RequestContext) -> Result<Self> {
    Ok(Autowired(ctx.injector()?.resolve::<T>()?))
  }
}

impl<T> Deref for Autowired<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T> Clone for Autowired<T> {
  fn clone(&self) -> Self {
    Autowired(self.0.clone())
  }
}

impl FromContext for Params {
  fn from_context(ctx: &RequestContext) -> Result<Self> {
    Ok(ctx.params().clone())
  }
}

impl FromContext for RequestContext {
  fn from_context(ctx: &RequestContext) -> Result<Self> {
    Ok(ctx.clone())
  }
}

/// The response produced so far. Only available to after and teardown hooks.
#[derive(Debug, Clone)]
pub struct CurrentResponse(pub Response);

impl FromContext for CurrentResponse {
  fn from_context(ctx: &RequestContext) -> Result<Self> {
    ctx.response().map(CurrentResponse).ok_or(Error::NoResponse)
  }
}

/// The error being handled. Teardown hooks see `None` after a clean request.
#[derive(Debug, Clone)]
pub struct Failure(pub Option<HandlerError>);

impl FromContext for Failure {
  fn from_context(ctx: &RequestContext) -> Result<Self> {
    Ok(Failure(ctx.failure()))
  }
}

/// Optional extraction: any failure becomes `None`.
impl<T: FromContext> FromContext for Option<T> {
  fn from_context(ctx: &RequestContext) -> Result<Self> {
    Ok(T::from_context(ctx).ok())
  }
}
