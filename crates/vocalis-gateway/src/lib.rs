//! Orchestration API facade for Vocalis.
//!
//! [`Gateway`] wires the intent classifier, command dispatcher, workflow
//! store, analyzer, and execution engine into the single surface callers
//! embed: `classify`, `dispatch`, workflow CRUD, `analyze_workflow`,
//! `execute_workflow`, and transcript-driven suggestion.  Construction
//! takes the capability seams (executors, optional text generator) as
//! explicit configuration — nothing global, nothing implicit.

pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use vocalis_exec::{Executors, TextGenerator};
use vocalis_intent::{CommandCapability, CommandDispatcher, CommandResult, IntentClassifier,
    IntentResult, IntentRule};
use vocalis_store::{Database, WorkflowStore};
use vocalis_workflow::{
    CancelToken, ExecutionResult, Step, TriggerKind, Workflow, WorkflowAnalysis,
    WorkflowAnalyzer, WorkflowEngine, WorkflowError, WorkflowSuggestion, suggest_from_transcript,
    validate_steps,
};

pub use error::{GatewayError, Result};

/// The voice/text command gateway core.
pub struct Gateway {
    classifier: IntentClassifier,
    dispatcher: CommandDispatcher,
    store: WorkflowStore,
    analyzer: WorkflowAnalyzer,
    engine: WorkflowEngine,
}

impl Gateway {
    /// Create a gateway over a database and executor set, with the built-in
    /// classification rules and no suggestion backend.
    pub fn new(db: Database, executors: Executors) -> Self {
        let store = WorkflowStore::new(db);
        Self {
            classifier: IntentClassifier::with_default_rules(),
            dispatcher: CommandDispatcher::new(executors.clone()),
            store: store.clone(),
            analyzer: WorkflowAnalyzer::new(),
            engine: WorkflowEngine::new(store, executors),
        }
    }

    /// Replace the classification rule set.
    pub fn with_rules(mut self, rules: Vec<IntentRule>) -> Self {
        self.classifier = IntentClassifier::new(rules);
        self
    }

    /// Attach a text-generation capability for analysis suggestions.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.analyzer = WorkflowAnalyzer::with_generator(generator);
        self
    }

    // -- Classification and dispatch -----------------------------------------

    /// Classify free-form text into a structured intent.  Total: always
    /// returns a result, with low confidence when nothing matched.
    pub fn classify(&self, text: &str) -> IntentResult {
        self.classifier.classify(text)
    }

    /// Dispatch a command string.  Never fails — failures come back as a
    /// zero-confidence [`CommandResult`].
    pub async fn dispatch(
        &self,
        command: &str,
        params: &HashMap<String, Value>,
    ) -> CommandResult {
        self.dispatcher.dispatch(command, params).await
    }

    /// List the command categories the dispatcher understands.
    pub fn capabilities(&self) -> Vec<CommandCapability> {
        self.dispatcher.capabilities()
    }

    // -- Workflow CRUD -------------------------------------------------------

    /// Create a workflow and return its id.
    ///
    /// Validates the step sequence (unique ids, resolvable `next_step`
    /// references) before persisting.
    pub async fn create_workflow(
        &self,
        name: &str,
        steps: Vec<Step>,
        trigger: TriggerKind,
        description: Option<&str>,
    ) -> Result<String> {
        validate_steps(&steps).map_err(GatewayError::Workflow)?;
        let steps_json = serde_json::to_value(&steps)?;
        let stored = self
            .store
            .create(name, description, steps_json, &trigger.to_string())
            .await?;
        info!(workflow_id = %stored.id, name = name, "workflow created");
        Ok(stored.id)
    }

    /// Fetch a workflow by id.
    pub async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow> {
        let stored =
            self.store
                .get(workflow_id)
                .await?
                .ok_or_else(|| WorkflowError::NotFound {
                    workflow_id: workflow_id.to_string(),
                })?;
        Ok(Workflow::try_from(stored).map_err(GatewayError::Workflow)?)
    }

    /// List workflows, most recently updated first.
    pub async fn list_workflows(&self, limit: i64, offset: i64) -> Result<Vec<Workflow>> {
        let stored = self.store.list(limit, offset).await?;
        stored
            .into_iter()
            .map(|s| Workflow::try_from(s).map_err(GatewayError::Workflow))
            .collect()
    }

    /// Delete a workflow by id.
    pub async fn delete_workflow(&self, workflow_id: &str) -> Result<()> {
        Ok(self.store.delete(workflow_id).await?)
    }

    // -- Analysis and execution ----------------------------------------------

    /// Analyze a step sequence: complexity, optimization, duration, and
    /// suggestions.
    pub async fn analyze_workflow(
        &self,
        steps: &[Step],
        context: &HashMap<String, Value>,
    ) -> WorkflowAnalysis {
        self.analyzer.analyze(steps, context).await
    }

    /// Execute a workflow by id.
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        parameters: HashMap<String, Value>,
    ) -> Result<ExecutionResult> {
        Ok(self.engine.execute(workflow_id, parameters).await?)
    }

    /// Execute a workflow with an externally held cancellation token.
    pub async fn execute_workflow_with_token(
        &self,
        workflow_id: &str,
        parameters: HashMap<String, Value>,
        token: CancelToken,
    ) -> Result<ExecutionResult> {
        Ok(self
            .engine
            .execute_with_token(workflow_id, parameters, token)
            .await?)
    }

    /// Request cancellation of every in-flight execution.
    pub fn cancel_all_executions(&self) {
        self.engine.cancel_all();
    }

    /// Number of in-flight executions.
    pub fn active_executions(&self) -> usize {
        self.engine.active_count()
    }

    /// Suggest a workflow from a voice transcript.
    pub fn suggest_workflow(&self, transcript: &str) -> WorkflowSuggestion {
        suggest_from_transcript(transcript)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
