//! Gateway error type.
//!
//! Aggregates the member-crate error taxonomies behind one type so callers
//! of the orchestration API handle a single error surface.

/// Unified error type for the gateway facade.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// An error from the workflow model, analyzer, or engine.
    #[error("workflow error: {0}")]
    Workflow(#[from] vocalis_workflow::WorkflowError),

    /// An error from the persistence layer.
    #[error("store error: {0}")]
    Store(#[from] vocalis_store::StoreError),

    /// An error from classification or dispatch configuration.
    #[error("intent error: {0}")]
    Intent(#[from] vocalis_intent::IntentError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the gateway crate.
pub type Result<T> = std::result::Result<T, GatewayError>;
