//! Capability traits consumed by the orchestration core.
//!
//! The core never performs side effects directly: launching an application,
//! touching a file, or running a shell command all go through an [`Executor`]
//! implementation supplied by the embedding host.  Speech-to-text and
//! suggestion text generation are likewise behind [`Transcriber`] and
//! [`TextGenerator`] seams so the core compiles and tests without any model
//! or audio machinery.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// The category of side effect an executor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// Raw system commands (shell passthrough).
    Command,
    /// File operations: copy, move, delete, backup, search.
    FileOperation,
    /// Application operations: launch, close, focus.
    AppOperation,
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::FileOperation => write!(f, "file_operation"),
            Self::AppOperation => write!(f, "app_operation"),
        }
    }
}

/// A finalized or partial speech-to-text result.
///
/// Produced by a [`Transcriber`]; the core only ever consumes the text and
/// confidence — codec and model details stay on the other side of the seam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// The recognized text.
    pub text: String,
    /// Recognition confidence between 0.0 and 1.0.
    pub confidence: f64,
    /// BCP-47 language tag (e.g. "en-US").
    pub language: String,
    /// Whether this is a final result or an interim hypothesis.
    pub is_final: bool,
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// The universal executor interface.
///
/// Every side-effecting collaborator implements this trait.  The dispatcher
/// and the workflow engine invoke actions via [`Executor::execute`] and treat
/// the returned JSON value as the step result.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Return the unique identifier for this executor instance.
    fn id(&self) -> &str;

    /// Return the category of side effect this executor performs.
    fn kind(&self) -> ExecutorKind;

    /// Execute a named action with the given JSON parameters.
    ///
    /// Returns a JSON value representing the action's output.
    async fn execute(&self, action: &str, params: Value) -> Result<Value>;
}

/// Optional text-completion capability used for workflow suggestions.
///
/// Absence of a generator degrades gracefully: suggestion lists come back
/// empty, never as an error.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Speech-to-text capability boundary.
///
/// The orchestration core never touches audio itself; a host that owns a
/// voice pipeline implements this trait and feeds the resulting
/// [`Transcript::text`] into classification.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio buffer into text.
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcript>;
}

// ---------------------------------------------------------------------------
// Executor registry
// ---------------------------------------------------------------------------

/// The set of executors the core dispatches to, one per [`ExecutorKind`].
#[derive(Clone)]
pub struct Executors {
    command: Arc<dyn Executor>,
    file_op: Arc<dyn Executor>,
    app_op: Arc<dyn Executor>,
}

impl Executors {
    /// Create a registry from one executor per kind.
    pub fn new(
        command: Arc<dyn Executor>,
        file_op: Arc<dyn Executor>,
        app_op: Arc<dyn Executor>,
    ) -> Self {
        Self {
            command,
            file_op,
            app_op,
        }
    }

    /// Resolve the executor responsible for the given kind.
    pub fn for_kind(&self, kind: ExecutorKind) -> &Arc<dyn Executor> {
        match kind {
            ExecutorKind::Command => &self.command,
            ExecutorKind::FileOperation => &self.file_op,
            ExecutorKind::AppOperation => &self.app_op,
        }
    }

    /// The command (shell) executor.
    pub fn command(&self) -> &Arc<dyn Executor> {
        &self.command
    }

    /// The file-operation executor.
    pub fn file_op(&self) -> &Arc<dyn Executor> {
        &self.file_op
    }

    /// The application-operation executor.
    pub fn app_op(&self) -> &Arc<dyn Executor> {
        &self.app_op
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoopExecutor;

    #[test]
    fn registry_resolves_by_kind() {
        let executors = Executors::new(
            Arc::new(NoopExecutor::new("cmd", ExecutorKind::Command)),
            Arc::new(NoopExecutor::new("file", ExecutorKind::FileOperation)),
            Arc::new(NoopExecutor::new("app", ExecutorKind::AppOperation)),
        );

        assert_eq!(executors.for_kind(ExecutorKind::Command).id(), "cmd");
        assert_eq!(executors.for_kind(ExecutorKind::FileOperation).id(), "file");
        assert_eq!(executors.for_kind(ExecutorKind::AppOperation).id(), "app");
    }

    #[test]
    fn executor_kind_display() {
        assert_eq!(ExecutorKind::Command.to_string(), "command");
        assert_eq!(ExecutorKind::FileOperation.to_string(), "file_operation");
        assert_eq!(ExecutorKind::AppOperation.to_string(), "app_operation");
    }

    #[test]
    fn transcript_round_trips_through_serde() {
        let t = Transcript {
            text: "open chrome".into(),
            confidence: 0.94,
            language: "en-US".into(),
            is_final: true,
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text, "open chrome");
        assert!(back.is_final);
    }
}
