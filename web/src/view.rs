//! Views: the endpoints routes dispatch to.
//!
//! Function views are any [`Handler`] whose output is a [`Responder`].
//! Class-based views implement [`View`]; a new instance is constructed from
//! the container for every call, with keyword arguments captured by
//! [`ViewBuilder`].

use crate::context::RequestContext;
use crate::error::{Error, HandlerError, Result};
use crate::handler::{erase_hook, handler_name, BoxedHook, Handler};
use crate::response::{Responder, Response};

use fibre_inject::Injector;
use futures_util::future::BoxFuture;
use http::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Name, documentation and methods of a view.
///
/// Carried through every wrapping step so routing and introspection see the
/// original view's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMeta {
  name: String,
  doc: Option<String>,
  methods: Vec<Method>,
}

impl ViewMeta {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      doc: None,
      methods: vec![Method::GET],
    }
  }

  pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
    self.doc = Some(doc.into());
    self
  }

  pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
    self.methods = methods.into_iter().collect();
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn doc(&self) -> Option<&str> {
    self.doc.as_deref()
  }

  pub fn methods(&self) -> &[Method] {
    &self.methods
  }
}

/// A type-erased view with its metadata.
#[derive(Clone)]
pub struct ViewFn {
  meta: Arc<ViewMeta>,
  call: BoxedHook<Response>,
}

impl ViewFn {
  pub(crate) fn new(meta: ViewMeta, call: BoxedHook<Response>) -> Self {
    Self {
      meta: Arc::new(meta),
      call,
    }
  }

  pub fn meta(&self) -> &ViewMeta {
    &self.meta
  }

  pub fn call(&self, ctx: RequestContext) -> BoxFuture<'static, Result<Response, HandlerError>> {
    (self.call)(ctx)
  }

  /// Wraps this view in `f`, which receives the context and the inner view.
  /// The metadata is kept.
  pub fn around<F, Fut>(self, f: F) -> ViewFn
  where
    F: Fn(RequestContext, ViewFn) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
  {
    let meta = self.meta.clone();
    let inner = self;
    let call: BoxedHook<Response> = Arc::new(
      move |ctx: RequestContext| -> BoxFuture<'static, Result<Response, HandlerError>> {
        Box::pin(f(ctx, inner.clone()))
      },
    );
    ViewFn { meta, call }
  }
}

impl fmt::Debug for ViewFn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ViewFn").field("meta", &self.meta).finish()
  }
}

/// A function applied to a class-based view every time it is wrapped.
pub type Decorator = fn(ViewFn) -> ViewFn;

/// Conversion into a [`ViewFn`]. `M` only distinguishes the implementations.
pub trait IntoView<M> {
  fn into_view(self) -> Result<ViewFn>;
}

#[doc(hidden)]
pub struct FunctionView<Args>(PhantomData<fn() -> Args>);

#[doc(hidden)]
pub struct ClassView;

#[doc(hidden)]
pub struct ErasedView;

impl<H, Args> IntoView<FunctionView<Args>> for H
where
  H: Handler<Args>,
  H::Output: Responder,
{
  fn into_view(self) -> Result<ViewFn> {
    let meta = ViewMeta::new(handler_name::<H>());
    Ok(ViewFn::new(
      meta,
      erase_hook(self, <H::Output as Responder>::respond),
    ))
  }
}

impl IntoView<ErasedView> for ViewFn {
  fn into_view(self) -> Result<ViewFn> {
    Ok(self)
  }
}

/// Keyword arguments passed to a class-based view's constructor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs(HashMap<String, serde_json::Value>);

impl Kwargs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
    self.0.insert(name.into(), value.into());
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  /// Deserializes the argument `name` into `T`.
  pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
    let value = self
      .0
      .get(name)
      .ok_or_else(|| Error::MissingParam(name.to_string()))?;
    serde_json::from_value(value.clone()).map_err(|e| Error::InvalidKwarg {
      name: name.to_string(),
      reason: e.to_string(),
    })
  }

  /// Like [`get`](Self::get), with a fallback for a missing argument.
  pub fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T> {
    if self.contains(name) {
      self.get(name)
    } else {
      Ok(default)
    }
  }
}

/// A class-based view.
///
/// The instance is built per call by [`construct`](View::construct), which
/// resolves collaborators from the container and reads its keyword arguments.
pub trait View: Send + Sync + Sized + 'static {
  fn construct(injector: &Injector, kwargs: &Kwargs) -> Result<Self>;

  fn dispatch(self: Arc<Self>, ctx: RequestContext) -> BoxFuture<'static, Result<Response, HandlerError>>;

  fn methods() -> Vec<Method> {
    vec![Method::GET]
  }

  /// Applied in order to the generated view, the first one innermost.
  fn decorators() -> Vec<Decorator> {
    Vec::new()
  }

  fn doc() -> Option<&'static str> {
    None
  }

  /// Starts building a view function named `name` for this class.
  fn as_view(name: impl Into<String>) -> ViewBuilder<Self> {
    ViewBuilder::as_view(name)
  }
}

/// The arguments a class-based view is turned into a view function with.
pub struct ViewBuilder<V> {
  name: String,
  args: Vec<serde_json::Value>,
  kwargs: Kwargs,
  _view: PhantomData<fn() -> V>,
}

impl<V: View> ViewBuilder<V> {
  pub fn as_view(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      args: Vec::new(),
      kwargs: Kwargs::new(),
      _view: PhantomData,
    }
  }

  /// Records a positional constructor argument.
  ///
  /// Injected views only accept keyword arguments, so wrapping a builder
  /// holding any positional argument fails with
  /// [`Error::PositionalViewArgs`].
  pub fn arg(mut self, value: impl Into<serde_json::Value>) -> Self {
    self.args.push(value.into());
    self
  }

  pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
    self.kwargs.insert(name, value);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl<V: View> IntoView<ClassView> for ViewBuilder<V> {
  fn into_view(self) -> Result<ViewFn> {
    if !self.args.is_empty() {
      return Err(Error::PositionalViewArgs);
    }

    let mut meta = ViewMeta::new(self.name).with_methods(V::methods());
    if let Some(doc) = V::doc() {
      meta = meta.with_doc(doc);
    }

    let kwargs = Arc::new(self.kwargs);
    let call: BoxedHook<Response> = Arc::new(
      move |ctx: RequestContext| -> BoxFuture<'static, Result<Response, HandlerError>> {
        let kwargs = kwargs.clone();
        Box::pin(async move {
          let injector = ctx.injector()?;
          let view = Arc::new(V::construct(&injector, &kwargs)?);
          view.dispatch(ctx).await
        })
      },
    );

    Ok(
      V::decorators()
        .into_iter()
        .fold(ViewFn::new(meta, call), |view, decorator| decorator(view)),
    )
  }
}
