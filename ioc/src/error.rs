use thiserror::Error;

/// Errors raised while registering or resolving services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A request-scoped service was resolved, or a scope was popped, while no
  /// scope frame was active on the calling task.
  #[error("no active request scope on the current task")]
  NoActiveScope,

  /// No binding exists for the requested type and it could not be auto-bound.
  #[error("unsatisfied requirement on {type_name}")]
  UnsatisfiedRequirement { type_name: &'static str },

  /// The service is (indirectly) part of its own dependency chain.
  #[error("circular dependency detected while resolving {type_name}")]
  CircularDependency { type_name: &'static str },

  /// A binding exists but cannot produce a value in the current context.
  #[error("{type_name} is unavailable: {reason}")]
  Unavailable {
    type_name: &'static str,
    reason: String,
  },

  /// The stored instance does not have the type it was registered under.
  #[error("stored instance for {type_name} has an unexpected type")]
  TypeMismatch { type_name: &'static str },
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
