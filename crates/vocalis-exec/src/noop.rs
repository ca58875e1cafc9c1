//! No-op executor — acknowledges actions without performing them.
//!
//! Useful for wiring up the engine before real file/app collaborators exist
//! and as a stand-in in tests.  The returned value echoes the action and
//! parameters so workflow steps can still chain on `${step_id}` templates.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::Result;
use crate::traits::{Executor, ExecutorKind};

/// An executor that records what it was asked to do and reports success.
pub struct NoopExecutor {
    id: String,
    kind: ExecutorKind,
}

impl NoopExecutor {
    /// Create a no-op executor with the given identity and kind.
    pub fn new(id: impl Into<String>, kind: ExecutorKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

#[async_trait]
impl Executor for NoopExecutor {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ExecutorKind {
        self.kind
    }

    async fn execute(&self, action: &str, params: Value) -> Result<Value> {
        debug!(executor = %self.id, action = action, "no-op execution");
        Ok(json!({
            "action": action,
            "parameters": params,
            "status": "executed",
        }))
    }
}
