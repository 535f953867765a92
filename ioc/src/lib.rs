//! # Fibre Inject
//!
//! A thread-safe dependency injection container with request-scoped lifetimes.
//!
//! ## Core Concepts
//!
//! - **Injector**: the registry of bindings. Built from [`Module`]s, optionally
//!   chained to a parent injector.
//! - **Lifetimes**: [`Lifetime::Transient`], [`Lifetime::Singleton`] and
//!   [`Lifetime::Request`]. Request-scoped services are cached in the top frame
//!   of the injector's [`RequestScope`], one frame per request.
//! - **Per-task frames**: scope frames live on a [`LocalStack`] private to each
//!   logical task, so concurrent requests never share instances.
//! - **Auto-binding**: types implementing [`Injectable`] can be resolved without
//!   being registered first.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{Binder, Injector};
//! use std::sync::Arc;
//!
//! struct Connection {
//!   id: usize,
//! }
//!
//! fn configure(binder: &Binder) {
//!   binder.add_request_scoped(|_| Ok(Connection { id: 7 }));
//! }
//!
//! let injector = Injector::builder().module(configure).build();
//! let scope = injector.request_scope();
//!
//! scope.push();
//! let a = injector.get::<Connection>().unwrap();
//! let b = injector.get::<Connection>().unwrap();
//! scope.pop().unwrap();
//!
//! assert_eq!(a.id, 7);
//! assert!(Arc::ptr_eq(&a, &b));
//!
//! scope.push();
//! let c = injector.get::<Connection>().unwrap();
//! scope.pop().unwrap();
//! assert!(!Arc::ptr_eq(&a, &c));
//! ```

mod binder;
mod core;
mod error;
mod injectable;
mod injector;
pub mod local_stack;
mod macros;
mod scope;

pub use binder::{Binder, Module};
pub use crate::core::{InjectionKey, Instance};
pub use error::{Error, Result};
pub use injectable::Injectable;
pub use injector::{Injector, InjectorBuilder};
pub use local_stack::{Frame, LocalStack};
pub use scope::{Lifetime, RequestScope};
