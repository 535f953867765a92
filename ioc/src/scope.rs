//! Lifetimes and the request scope.

use crate::core::{erase, InjectionKey, Instance};
use crate::error::Result;
use crate::local_stack::LocalStack;
use std::any::Any;
use std::sync::Arc;

/// How often a binding's factory runs versus how often its result is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
  /// A new instance for every resolution.
  #[default]
  Transient,
  /// One instance for the lifetime of the container.
  Singleton,
  /// One instance per request (or websocket connection) scope frame.
  Request,
}

/// Caches one instance per key for each pushed scope frame.
///
/// A frame must be pushed on the calling task before request-scoped services
/// are resolved. Within a frame every resolution of a key yields the same
/// instance; a later frame starts empty.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
  stack: LocalStack,
}

impl RequestScope {
  pub fn new() -> Self {
    Self::default()
  }

  /// Opens a new scope frame on the calling task.
  pub fn push(&self) {
    self.stack.push();
    tracing::debug!(depth = self.stack.depth(), "request scope pushed");
  }

  /// Closes the innermost scope frame on the calling task.
  pub fn pop(&self) -> Result<()> {
    let frame = self.stack.pop()?;
    tracing::debug!(
      depth = self.stack.depth(),
      cached = frame.len(),
      "request scope popped"
    );
    Ok(())
  }

  pub fn depth(&self) -> usize {
    self.stack.depth()
  }

  pub fn is_active(&self) -> bool {
    self.stack.is_active()
  }

  /// Returns the instance cached under `key` in the top frame, running
  /// `factory` and caching its result on a miss.
  ///
  /// The frame is not borrowed while `factory` runs, so it may resolve other
  /// request-scoped services.
  pub fn get(&self, key: &InjectionKey, factory: impl FnOnce() -> Result<Instance>) -> Result<Instance> {
    if let Some(hit) = self.stack.with_top(|frame| frame.get(key).cloned())? {
      tracing::trace!(?key, "request scope hit");
      return Ok(hit);
    }

    let created = factory()?;
    self
      .stack
      .with_top(|frame| frame.entry(key.clone()).or_insert(created).clone())
  }

  /// Seeds the top frame with a value derived from the current request.
  pub fn provide<T: ?Sized + Any + Send + Sync>(&self, value: Arc<T>) -> Result<()> {
    self.provide_key(InjectionKey::of::<T>(), erase(value))
  }

  pub fn provide_key(&self, key: InjectionKey, instance: Instance) -> Result<()> {
    self.stack.with_top(|frame| {
      frame.insert(key, instance);
    })
  }
}
