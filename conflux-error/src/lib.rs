#![allow(clippy::multiple_crate_versions)]
//! Error types for the push-pull reactive streaming core.
//!
//! This crate defines the root [`ConfluxError`] type shared by the queue,
//! executor, buffered-subscriber, and Reactive Streams bridge crates. Keeping
//! it in its own crate lets every layer depend on the same error vocabulary
//! without pulling in the rest of the stack.
//!
//! # Examples
//!
//! ```
//! use conflux_error::{ConfluxError, Result};
//!
//! fn process_data() -> Result<()> {
//!     Err(ConfluxError::protocol_violation("element must not be null"))
//! }
//! ```

/// Root error type for all reactive-streaming-core operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfluxError {
    /// The caller violated the observer or Reactive Streams contract: a null
    /// element, a double `onSubscribe`, a non-positive `request(n)`, and so on.
    #[error("protocol violation: {context}")]
    ProtocolViolation {
        /// Description of the violated contract.
        context: String,
    },

    /// The internal buffer overflowed under the `Fail` overflow strategy.
    ///
    /// Delivered to the downstream observer as the terminal `onError`; the
    /// producer whose `onNext` triggered it receives `Stop`.
    #[error("buffer overflow: capacity {capacity} exceeded")]
    BufferOverflow {
        /// The configured capacity that was exceeded.
        capacity: usize,
    },

    /// Submitting work to the configured executor was rejected.
    #[error("executor rejected submission: {context}")]
    ExecutorRejected {
        /// Description of what was being submitted.
        context: String,
    },

    /// A time-based operation exceeded its deadline.
    #[error("operation timed out: {context}")]
    Timeout {
        /// Context about the timed-out operation.
        context: String,
    },

    /// Error acquiring a lock on shared state; indicates a poisoned mutex.
    #[error("failed to acquire lock: {context}")]
    LockError {
        /// Description of the lock that failed.
        context: String,
    },

    /// Custom error surfaced by downstream or user code.
    #[error("downstream error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Multiple errors occurred, e.g. while fanning work out across producers.
    #[error("multiple errors occurred: {count} errors")]
    MultipleErrors {
        /// Number of errors aggregated.
        count: usize,
        /// The individual errors (bounded to avoid unbounded growth).
        errors: Vec<ConfluxError>,
    },

    /// An error that occurred while a terminal was already being delivered.
    ///
    /// Per the "Stop wins" policy, a second terminal is never redelivered;
    /// instead it rides along as a suppressed companion of the first.
    #[error("{primary}")]
    WithSuppressed {
        /// The error that was actually delivered downstream.
        primary: Box<ConfluxError>,
        /// The error that arrived after a terminal was already in flight.
        suppressed: Box<ConfluxError>,
    },
}

impl ConfluxError {
    /// Create a protocol-violation error with the given context.
    pub fn protocol_violation(context: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            context: context.into(),
        }
    }

    /// Create a buffer-overflow error for the given capacity.
    #[must_use]
    pub const fn buffer_overflow(capacity: usize) -> Self {
        Self::BufferOverflow { capacity }
    }

    /// Create an executor-rejected error with the given context.
    pub fn executor_rejected(context: impl Into<String>) -> Self {
        Self::ExecutorRejected {
            context: context.into(),
        }
    }

    /// Create a timeout error with the given context.
    pub fn timeout(context: impl Into<String>) -> Self {
        Self::Timeout {
            context: context.into(),
        }
    }

    /// Create a lock error with the given context.
    pub fn lock_error(context: impl Into<String>) -> Self {
        Self::LockError {
            context: context.into(),
        }
    }

    /// Wrap a user/downstream error.
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Aggregate multiple errors into a single `MultipleErrors` variant.
    pub fn from_user_errors<E>(errors: Vec<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let count = errors.len();
        let errors = errors.into_iter().map(Self::user_error).collect();
        Self::MultipleErrors { count, errors }
    }

    /// Attach `other` as a suppressed companion of `self`.
    ///
    /// Used when a second terminal (e.g. a downstream failure that arrives
    /// after an upstream error has already started delivery) must not be
    /// redelivered but should not be silently dropped either.
    #[must_use]
    pub fn with_suppressed(self, other: Self) -> Self {
        Self::WithSuppressed {
            primary: Box::new(self),
            suppressed: Box::new(other),
        }
    }

    /// Some errors indicate transient failures that could succeed on retry.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::LockError { .. } | Self::Timeout { .. })
    }

    /// User errors and buffer overflows are permanent: retrying will not help.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::BufferOverflow { .. } | Self::ProtocolViolation { .. } | Self::UserError(_)
        )
    }
}

impl Clone for ConfluxError {
    fn clone(&self) -> Self {
        match self {
            Self::ProtocolViolation { context } => Self::ProtocolViolation {
                context: context.clone(),
            },
            Self::BufferOverflow { capacity } => Self::BufferOverflow {
                capacity: *capacity,
            },
            Self::ExecutorRejected { context } => Self::ExecutorRejected {
                context: context.clone(),
            },
            Self::Timeout { context } => Self::Timeout {
                context: context.clone(),
            },
            Self::LockError { context } => Self::LockError {
                context: context.clone(),
            },
            // UserError can't be cloned (the boxed error isn't Clone); fold it
            // into a stringly-typed description instead of losing the variant.
            Self::UserError(e) => Self::ProtocolViolation {
                context: format!("user error: {e}"),
            },
            Self::MultipleErrors { count, errors } => Self::MultipleErrors {
                count: *count,
                errors: errors.clone(),
            },
            Self::WithSuppressed {
                primary,
                suppressed,
            } => Self::WithSuppressed {
                primary: primary.clone(),
                suppressed: suppressed.clone(),
            },
        }
    }
}

/// Specialized `Result` for reactive-streaming-core operations.
pub type Result<T> = std::result::Result<T, ConfluxError>;

/// Helper trait for adding context to `Result`s in a fluent style.
pub trait ResultExt<T> {
    /// Add static context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazily-computed context to an error.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ConfluxError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| match e.into() {
            ConfluxError::UserError(inner) => ConfluxError::ProtocolViolation {
                context: format!("{}: {inner}", context.into()),
            },
            other => other,
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            ConfluxError::UserError(inner) => ConfluxError::ProtocolViolation {
                context: format!("{}: {inner}", f()),
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_overflow_is_permanent() {
        let err = ConfluxError::buffer_overflow(128);
        assert!(err.is_permanent());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn with_suppressed_preserves_both() {
        let primary = ConfluxError::protocol_violation("first");
        let secondary = ConfluxError::protocol_violation("second");
        let combined = primary.with_suppressed(secondary);
        match combined {
            ConfluxError::WithSuppressed {
                primary,
                suppressed,
            } => {
                assert!(matches!(*primary, ConfluxError::ProtocolViolation { .. }));
                assert!(matches!(*suppressed, ConfluxError::ProtocolViolation { .. }));
            }
            _ => panic!("expected WithSuppressed"),
        }
    }

    #[test]
    fn from_user_errors_counts_correctly() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom: {0}")]
        struct Boom(&'static str);

        let errs = vec![Boom("a"), Boom("b"), Boom("c")];
        let agg = ConfluxError::from_user_errors(errs);
        assert!(matches!(agg, ConfluxError::MultipleErrors { count: 3, .. }));
    }
}
