//! Executor error types.
//!
//! All executor capabilities surface errors through [`ExecError`].  Each
//! variant carries enough context for callers to decide how to handle the
//! failure without inspecting opaque strings.

/// Unified error type for Vocalis executor capabilities.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// An I/O operation failed within the executor.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor does not implement the requested action.
    #[error("action not supported: `{action}` on executor `{executor_id}`")]
    ActionNotSupported {
        executor_id: String,
        action: String,
    },

    /// The parameters supplied to an action are invalid.
    #[error("invalid parameters for action `{action}`: {reason}")]
    InvalidParams { action: String, reason: String },

    /// An action invocation failed.
    #[error("execution failed for action `{action}`: {reason}")]
    ExecutionFailed { action: String, reason: String },

    /// An operation exceeded its time limit.
    #[error("timeout after {seconds}s: {reason}")]
    Timeout { seconds: u64, reason: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.  Prefer a typed variant
    /// whenever possible.
    #[error("internal executor error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the executor crate.
pub type Result<T> = std::result::Result<T, ExecError>;
