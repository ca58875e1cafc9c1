//! Intent engine error types.
//!
//! Classification and dispatch never leak errors past their public
//! boundaries — classification is total and dispatch collapses every
//! failure into a low-confidence [`crate::dispatcher::CommandResult`].
//! [`IntentError`] exists for the fallible edges: rule construction and
//! executor invocation inside handlers.

/// Unified error type for the intent crate.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// A rule pattern failed to compile.
    #[error("invalid rule pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An executor invoked by a dispatch handler failed.
    #[error("executor error: {0}")]
    Exec(#[from] vocalis_exec::ExecError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
