//! Workflow engine error types.
//!
//! All workflow subsystems surface errors through [`WorkflowError`].
//! Executor failures abort the whole run and carry the partial results map
//! so callers can see how far execution got before the failure.

use std::collections::HashMap;

use serde_json::Value;

/// Unified error type for the workflow crate.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The referenced workflow does not exist.
    #[error("workflow not found: {workflow_id}")]
    NotFound { workflow_id: String },

    /// The workflow definition violates a structural invariant (dangling
    /// `next_step` reference, duplicate step id, malformed stored steps).
    #[error("invalid workflow definition: {reason}")]
    InvalidDefinition { reason: String },

    /// A step's executor failed, aborting the run.  `results` holds every
    /// step result recorded before the failing step — fail-fast, no
    /// rollback, no retry.
    #[error("step `{step_id}` failed in workflow {workflow_id}: {source}")]
    StepFailed {
        workflow_id: String,
        step_id: String,
        steps_executed: usize,
        results: HashMap<String, Value>,
        #[source]
        source: vocalis_exec::ExecError,
    },

    /// An error propagated from the store crate.
    #[error("store error: {0}")]
    Store(#[from] vocalis_store::StoreError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the workflow crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;
