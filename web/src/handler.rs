//! Turning async functions into injecting, type-erased hooks.
//!
//! A handler is any `Clone` async function or closure whose parameters all
//! implement [`FromContext`]. Calling it extracts every parameter from the
//! [`RequestContext`] (resolving dependencies from the container) and then
//! awaits the function.

use crate::context::RequestContext;
use crate::error::HandlerError;
use crate::extract::FromContext;

use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A type-erased hook as stored in the app's hook lists.
pub type BoxedHook<T> =
  Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Result<T, HandlerError>> + Send + Sync>;

/// An async function whose arguments are extracted from a [`RequestContext`].
///
/// `Args` is a tuple of the parameter types; it only exists to keep the
/// implementations for different arities apart.
pub trait Handler<Args>: Clone + Send + Sync + Sized + 'static {
  type Output: Send + 'static;

  /// Extracts the arguments and runs the handler.
  ///
  /// Extraction happens before the returned future is first polled, so every
  /// dependency is resolved against the caller's active scope.
  fn call(&self, ctx: &RequestContext) -> BoxFuture<'static, Result<Self::Output, HandlerError>>;
}

macro_rules! impl_handler {
  ($($ty:ident),*) => {
    #[allow(non_snake_case, unused_variables)]
    impl<F, Fut, $($ty,)*> Handler<($($ty,)*)> for F
    where
      F: Fn($($ty),*) -> Fut + Clone + Send + Sync + 'static,
      Fut: Future + Send + 'static,
      Fut::Output: Send + 'static,
      $($ty: FromContext + Send + 'static,)*
    {
      type Output = Fut::Output;

      fn call(&self, ctx: &RequestContext) -> BoxFuture<'static, Result<Self::Output, HandlerError>> {
        $(
          let $ty = match $ty::from_context(ctx) {
            Ok(value) => value,
            Err(err) => {
              let err = HandlerError::from(err);
              return Box::pin(async move { Err(err) });
            }
          };
        )*
        let fut = (self)($($ty),*);
        Box::pin(async move { Ok(fut.await) })
      }
    }
  };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

/// Erases `handler` into a hook whose output is post-processed by `convert`.
pub(crate) fn erase_hook<H, Args, O>(
  handler: H,
  convert: fn(H::Output) -> Result<O, HandlerError>,
) -> BoxedHook<O>
where
  H: Handler<Args>,
  O: 'static,
{
  Arc::new(move |ctx: RequestContext| -> BoxFuture<'static, Result<O, HandlerError>> {
    let fut = handler.call(&ctx);
    Box::pin(async move { convert(fut.await?) })
  })
}

/// Short name of a handler type, used as view metadata.
pub(crate) fn handler_name<H>() -> String {
  let full = std::any::type_name::<H>();
  let trimmed = full.trim_end_matches("::{{closure}}");
  trimmed.rsplit("::").next().unwrap_or(trimmed).to_string()
}
