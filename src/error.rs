//! Error types for hive session operations.
//!
//! Every failure an operation can report to its caller is a [`SessionError`].
//! The one condition that is *not* reportable, reaching an operation while the
//! engine is not compiled in, goes through [`capability_violation`] instead
//! and terminates the process.

use std::io;
use thiserror::Error;
use tracing::error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors reported by the operation dispatcher.
///
/// Each variant carries the wire name of the operation that failed, so the
/// `Display` output is already in the shape of a failure reply.
#[derive(Error, Debug)]
pub enum SessionError {
    /// An operation other than `hivex_open` ran without an open session.
    #[error("{op}: you must call 'hivex-open' first to initialize the hivex handle")]
    Precondition {
        /// Operation that was refused.
        op: &'static str,
    },

    /// Local allocation or path resolution failed.
    #[error("{op}: {context}: {source}")]
    Resource {
        /// Operation that failed.
        op: &'static str,
        /// What the adapter was doing (e.g. "malloc").
        context: String,
        /// Underlying system error.
        #[source]
        source: io::Error,
    },

    /// The hive engine reported a failure.
    #[error("{op}: {context}: {source}")]
    Engine {
        /// Operation that failed.
        op: &'static str,
        /// Short description supplied by the adapter.
        context: String,
        /// Error reported by the engine.
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    /// Creates a precondition error for `op`.
    pub fn precondition(op: &'static str) -> Self {
        Self::Precondition { op }
    }

    /// Creates a resource error.
    ///
    /// # Arguments
    ///
    /// * `op` - Operation that failed
    /// * `context` - What was being attempted
    /// * `source` - The underlying I/O or allocation error
    pub fn resource(op: &'static str, context: impl Into<String>, source: io::Error) -> Self {
        Self::Resource {
            op,
            context: context.into(),
            source,
        }
    }

    /// Creates an engine error wrapping the engine's own failure.
    pub fn engine(op: &'static str, context: impl Into<String>, source: io::Error) -> Self {
        Self::Engine {
            op,
            context: context.into(),
            source,
        }
    }

    /// Creates an engine error for a call that returned the zero handle
    /// without reporting an error of its own.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hivex_session::error::SessionError;
    /// let err = SessionError::null_handle("hivex_root");
    /// assert!(err.to_string().starts_with("hivex_root: failed"));
    /// ```
    pub fn null_handle(op: &'static str) -> Self {
        Self::engine(
            op,
            "failed",
            io::Error::new(io::ErrorKind::InvalidData, "engine returned the null handle"),
        )
    }

    /// Returns the wire name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            SessionError::Precondition { op }
            | SessionError::Resource { op, .. }
            | SessionError::Engine { op, .. } => op,
        }
    }

    /// Returns true if the error only means no session was open.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SessionError::Precondition { .. })
    }
}

/// Aborts the process because `op` was reached with no engine compiled in.
///
/// The dispatch layer must never route a request to an unavailable
/// operation, so this is a build or wiring defect rather than a request
/// failure. Nothing is returned to the caller.
pub fn capability_violation(op: &'static str) -> ! {
    error!(op, "hivex operation reached but the hivex engine is not available in this build");
    std::process::abort()
}
