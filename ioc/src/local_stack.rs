//! A per-task stack of scope frames.
//!
//! Every [`LocalStack`] is a handle identified by a process-unique id. The frames
//! behind that id live in storage private to the calling logical task:
//!
//! - inside [`isolate`] / [`isolate_sync`], storage is a `tokio` task-local slot
//!   created fresh for that task;
//! - everywhere else, storage is a thread-local slot.
//!
//! Two tasks never observe each other's frames, even when they interleave on
//! the same worker thread, and no locking is involved.

use crate::core::{InjectionKey, Instance};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// The cache of already-constructed scoped instances for one scope entry.
pub type Frame = HashMap<InjectionKey, Instance>;

static NEXT_STACK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct Slots {
  stacks: HashMap<u64, Vec<Frame>>,
}

tokio::task_local! {
  static TASK_SLOTS: RefCell<Slots>;
}

thread_local! {
  static THREAD_SLOTS: RefCell<Slots> = RefCell::new(Slots::default());
}

// `f` must not re-enter this function.
fn with_slots<R>(f: impl FnOnce(&mut Slots) -> R) -> R {
  if TASK_SLOTS.try_with(|_| ()).is_ok() {
    TASK_SLOTS.with(|slots| f(&mut slots.borrow_mut()))
  } else {
    THREAD_SLOTS.with(|slots| f(&mut slots.borrow_mut()))
  }
}

/// Runs `future` as its own logical task with empty stack storage.
pub async fn isolate<F: Future>(future: F) -> F::Output {
  TASK_SLOTS
    .scope(RefCell::new(Slots::default()), future)
    .await
}

/// Synchronous counterpart of [`isolate`].
pub fn isolate_sync<R>(f: impl FnOnce() -> R) -> R {
  TASK_SLOTS.sync_scope(RefCell::new(Slots::default()), f)
}

/// A handle to a stack of [`Frame`]s that is private to each logical task.
///
/// Clones share the same identity, so they address the same stack.
#[derive(Debug, Clone)]
pub struct LocalStack {
  id: u64,
}

impl LocalStack {
  pub fn new() -> Self {
    Self {
      id: NEXT_STACK_ID.fetch_add(1, Ordering::Relaxed),
    }
  }

  /// Pushes a new, empty frame for the calling task.
  pub fn push(&self) {
    self.push_frame(Frame::new());
  }

  pub fn push_frame(&self, frame: Frame) {
    with_slots(|slots| slots.stacks.entry(self.id).or_default().push(frame));
  }

  /// Removes and returns the topmost frame of the calling task.
  pub fn pop(&self) -> Result<Frame> {
    with_slots(|slots| {
      let stack = slots.stacks.get_mut(&self.id).ok_or(Error::NoActiveScope)?;
      let frame = stack.pop().ok_or(Error::NoActiveScope)?;
      if stack.is_empty() {
        slots.stacks.remove(&self.id);
      }
      Ok(frame)
    })
  }

  /// Gives `f` mutable access to the topmost frame of the calling task.
  ///
  /// The frame is taken out of storage while `f` runs, so `f` may use any
  /// stack, this one included. Entries added to the same frame by nested
  /// calls are merged back. If the stack no longer reaches that frame once
  /// `f` returns, the taken frame is dropped.
  pub fn with_top<R>(&self, f: impl FnOnce(&mut Frame) -> R) -> Result<R> {
    let (index, frame) = with_slots(|slots| {
      let stack = slots.stacks.get_mut(&self.id).ok_or(Error::NoActiveScope)?;
      let index = stack.len().checked_sub(1).ok_or(Error::NoActiveScope)?;
      Ok::<_, Error>((index, std::mem::take(&mut stack[index])))
    })?;

    let mut taken = TakenFrame {
      stack: self,
      index,
      frame,
    };
    Ok(f(&mut taken.frame))
  }

  /// Number of frames pushed and not yet popped on the calling task.
  pub fn depth(&self) -> usize {
    with_slots(|slots| slots.stacks.get(&self.id).map_or(0, Vec::len))
  }

  pub fn is_active(&self) -> bool {
    self.depth() > 0
  }
}

/// Puts a frame taken by [`LocalStack::with_top`] back, also on unwind.
struct TakenFrame<'a> {
  stack: &'a LocalStack,
  index: usize,
  frame: Frame,
}

impl Drop for TakenFrame<'_> {
  fn drop(&mut self) {
    let mut frame = std::mem::take(&mut self.frame);
    let index = self.index;
    with_slots(|slots| {
      if let Some(slot) = slots
        .stacks
        .get_mut(&self.stack.id)
        .and_then(|stack| stack.get_mut(index))
      {
        frame.extend(std::mem::take(slot));
        *slot = frame;
      }
    });
  }
}

impl Default for LocalStack {
  fn default() -> Self {
    Self::new()
  }
}
