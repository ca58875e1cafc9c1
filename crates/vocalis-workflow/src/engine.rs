//! Workflow execution engine.
//!
//! Executes a stored workflow by walking its step chain from `steps[0]`,
//! strictly sequentially: step *n+1* never begins before step *n*'s result
//! is recorded in the execution context.  Each run owns an isolated
//! context, so any number of executions may proceed concurrently.
//!
//! Step chains are not statically validated to be acyclic, so the engine
//! enforces a hard bound of [`MAX_STEPS`] steps and reports `Aborted` when
//! it trips.  Executor failures are fail-fast: the run aborts with the
//! partial results collected so far, and nothing is rolled back or retried.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use vocalis_exec::Executors;
use vocalis_store::WorkflowStore;

use crate::error::{Result, WorkflowError};
use crate::model::{Step, StepKind, Workflow};

/// Hard per-run step bound — the cycle guard.
pub const MAX_STEPS: usize = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The lifecycle state of one workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Created but not yet started.
    Pending,
    /// Currently walking the step chain.
    Running,
    /// Reached a step without a successor.
    Completed,
    /// Stopped early: cancellation or the step bound.
    Aborted,
}

/// The outcome of one workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The workflow that was executed.
    pub workflow_id: String,
    /// Terminal status of the run.
    pub status: ExecutionStatus,
    /// Wall-clock execution time in seconds.
    pub execution_time: f64,
    /// How many steps actually ran.
    pub steps_executed: usize,
    /// Per-step results keyed by step id.
    pub results: HashMap<String, Value>,
}

/// Cooperative cancellation flag for one execution.
///
/// Checked at each step boundary; a step already dispatched to an executor
/// is never interrupted (executors own their own timeouts).
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation at the next step boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The workflow execution engine.
///
/// Shared-nothing per run: each call to [`WorkflowEngine::execute`] builds
/// its own context, so the engine itself can be shared behind `Arc` and
/// driven concurrently.
pub struct WorkflowEngine {
    store: WorkflowStore,
    executors: Executors,
    /// Cancel tokens of in-flight runs, keyed by run id.
    in_flight: DashMap<Uuid, CancelToken>,
}

impl WorkflowEngine {
    /// Create an engine over the given store and executor set.
    pub fn new(store: WorkflowStore, executors: Executors) -> Self {
        Self {
            store,
            executors,
            in_flight: DashMap::new(),
        }
    }

    /// Execute a workflow by id with caller-supplied parameters.
    pub async fn execute(
        &self,
        workflow_id: &str,
        parameters: HashMap<String, Value>,
    ) -> Result<ExecutionResult> {
        self.execute_with_token(workflow_id, parameters, CancelToken::new())
            .await
    }

    /// Execute a workflow with an externally held [`CancelToken`].
    ///
    /// Returns [`WorkflowError::NotFound`] for an unknown id and
    /// [`WorkflowError::StepFailed`] when an executor fails; the step bound
    /// and cancellation are reported as an `Aborted` result, not an error.
    pub async fn execute_with_token(
        &self,
        workflow_id: &str,
        parameters: HashMap<String, Value>,
        token: CancelToken,
    ) -> Result<ExecutionResult> {
        let stored = self
            .store
            .get(workflow_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound {
                workflow_id: workflow_id.to_string(),
            })?;
        let workflow = Workflow::try_from(stored)?;

        if workflow.steps.is_empty() {
            return Err(WorkflowError::InvalidDefinition {
                reason: format!("workflow {workflow_id} has no steps"),
            });
        }

        let run_id = Uuid::now_v7();
        self.in_flight.insert(run_id, token.clone());
        let result = self.run(&workflow, parameters, &token).await;
        self.in_flight.remove(&run_id);
        result
    }

    /// Number of currently executing runs.
    pub fn active_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Request cancellation of every in-flight run.
    ///
    /// Each run stops at its next step boundary and reports `Aborted`.
    pub fn cancel_all(&self) {
        for entry in self.in_flight.iter() {
            entry.value().cancel();
        }
    }

    // -- Run loop ------------------------------------------------------------

    /// Walk the step chain of one workflow.
    async fn run(
        &self,
        workflow: &Workflow,
        parameters: HashMap<String, Value>,
        token: &CancelToken,
    ) -> Result<ExecutionResult> {
        info!(
            workflow_id = %workflow.id,
            name = %workflow.name,
            steps = workflow.steps.len(),
            "starting workflow execution"
        );

        let started = Instant::now();

        // Seed the context with caller parameters plus the start timestamp.
        let mut context = parameters;
        context.insert(
            "workflow_start_time".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let mut results: HashMap<String, Value> = HashMap::new();
        let mut steps_executed = 0usize;
        let mut status = ExecutionStatus::Completed;
        let mut current = workflow.steps.first();

        while let Some(step) = current {
            if token.is_cancelled() {
                info!(workflow_id = %workflow.id, "execution cancelled");
                status = ExecutionStatus::Aborted;
                break;
            }
            if steps_executed >= MAX_STEPS {
                warn!(
                    workflow_id = %workflow.id,
                    steps_executed,
                    "workflow execution exceeded step limit"
                );
                status = ExecutionStatus::Aborted;
                break;
            }

            debug!(
                workflow_id = %workflow.id,
                step_id = %step.id,
                kind = %step.kind,
                "executing workflow step"
            );

            let step_result = self.execute_step(step, &context).await.map_err(|source| {
                WorkflowError::StepFailed {
                    workflow_id: workflow.id.clone(),
                    step_id: step.id.clone(),
                    steps_executed,
                    results: results.clone(),
                    source,
                }
            })?;

            // Record the result before advancing so later steps can
            // reference it via `${step_id}` templates.
            context.insert(step.id.clone(), step_result.clone());
            results.insert(step.id.clone(), step_result);
            steps_executed += 1;

            current = step
                .next_step
                .as_ref()
                .and_then(|next_id| workflow.step(next_id));
        }

        let execution_time = started.elapsed().as_secs_f64();
        info!(
            workflow_id = %workflow.id,
            status = ?status,
            steps_executed,
            execution_time,
            "workflow execution finished"
        );

        Ok(ExecutionResult {
            workflow_id: workflow.id.clone(),
            status,
            execution_time,
            steps_executed,
            results,
        })
    }

    /// Execute a single step with its parameters resolved against the
    /// current context.
    async fn execute_step(
        &self,
        step: &Step,
        context: &HashMap<String, Value>,
    ) -> vocalis_exec::Result<Value> {
        let resolved = resolve_parameters(&step.parameters, context);

        match step.kind {
            StepKind::Command => {
                self.executors
                    .command()
                    .execute(&step.action, json!(resolved))
                    .await
            }
            StepKind::FileOperation => {
                self.executors
                    .file_op()
                    .execute(&step.action, json!(resolved))
                    .await
            }
            StepKind::AppOperation => {
                self.executors
                    .app_op()
                    .execute(&step.action, json!(resolved))
                    .await
            }
            StepKind::Delay => {
                let duration = resolved
                    .get("duration")
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0);
                tokio::time::sleep(std::time::Duration::from_secs_f64(duration.max(0.0))).await;
                Ok(json!({ "status": "delayed", "duration": duration }))
            }
            StepKind::Condition => {
                // No branch DSL: a condition step records its evaluation and
                // follows the ordinary chain.
                Ok(json!({ "status": "evaluated", "condition": step.action }))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Template resolution
// ---------------------------------------------------------------------------

/// Resolve `${key}` templates in step parameters against the context.
///
/// Only whole-string templates are recognized: a value that is exactly
/// `${key}` is replaced by `context[key]` when present, and left as the
/// literal template string otherwise.  There is no partial interpolation
/// inside longer strings.
fn resolve_parameters(
    parameters: &HashMap<String, Value>,
    context: &HashMap<String, Value>,
) -> HashMap<String, Value> {
    parameters
        .iter()
        .map(|(key, value)| {
            let resolved = match template_key(value) {
                Some(context_key) => context.get(context_key).cloned().unwrap_or_else(|| value.clone()),
                None => value.clone(),
            };
            (key.clone(), resolved)
        })
        .collect()
}

/// Return the inner key if `value` is exactly a `${key}` template string.
fn template_key(value: &Value) -> Option<&str> {
    let s = value.as_str()?;
    s.strip_prefix("${")?.strip_suffix('}')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use vocalis_exec::{ExecError, Executor, ExecutorKind, NoopExecutor};
    use vocalis_store::Database;

    use crate::model::{Step, StepKind, validate_steps};

    /// Executor that fails every invocation.
    struct FailingExecutor;

    #[async_trait]
    impl Executor for FailingExecutor {
        fn id(&self) -> &str {
            "failing"
        }
        fn kind(&self) -> ExecutorKind {
            ExecutorKind::FileOperation
        }
        async fn execute(&self, action: &str, _params: Value) -> vocalis_exec::Result<Value> {
            Err(ExecError::ExecutionFailed {
                action: action.to_string(),
                reason: "deliberate test failure".into(),
            })
        }
    }

    fn noop_executors() -> Executors {
        Executors::new(
            Arc::new(NoopExecutor::new("cmd", ExecutorKind::Command)),
            Arc::new(NoopExecutor::new("file", ExecutorKind::FileOperation)),
            Arc::new(NoopExecutor::new("app", ExecutorKind::AppOperation)),
        )
    }

    async fn setup_engine(executors: Executors) -> (WorkflowEngine, WorkflowStore) {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        let store = WorkflowStore::new(db);
        (WorkflowEngine::new(store.clone(), executors), store)
    }

    async fn create_workflow(store: &WorkflowStore, steps: &[Step]) -> String {
        validate_steps(steps).unwrap();
        let stored = store
            .create(
                "test-workflow",
                None,
                serde_json::to_value(steps).unwrap(),
                "manual",
            )
            .await
            .unwrap();
        stored.id
    }

    #[tokio::test]
    async fn single_step_roundtrip_completes() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let id = create_workflow(&store, &[Step::new("s1", StepKind::Command, "date")]).await;

        let result = engine.execute(&id, HashMap::new()).await.unwrap();
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.steps_executed, 1);
        assert_eq!(result.workflow_id, id);
        assert!(result.results.contains_key("s1"));
    }

    #[tokio::test]
    async fn chain_follows_next_step_ids() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let steps = [
            Step::new("a", StepKind::Command, "one").with_next("b"),
            Step::new("b", StepKind::AppOperation, "launch").with_next("c"),
            Step::new("c", StepKind::Condition, "done"),
        ];
        let id = create_workflow(&store, &steps).await;

        let result = engine.execute(&id, HashMap::new()).await.unwrap();
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.steps_executed, 3);
        assert_eq!(result.results["c"]["status"], "evaluated");
    }

    #[tokio::test]
    async fn unknown_workflow_is_not_found() {
        let (engine, _store) = setup_engine(noop_executors()).await;
        let err = engine.execute("wf_missing", HashMap::new()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { .. }));
    }

    #[tokio::test]
    async fn empty_workflow_is_invalid() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let id = create_workflow(&store, &[]).await;
        let err = engine.execute(&id, HashMap::new()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidDefinition { .. }));
    }

    #[tokio::test]
    async fn template_parameters_resolve_from_context() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let steps = [Step::new("s1", StepKind::FileOperation, "copy")
            .with_parameter("source", "${source_dir}")
            .with_parameter("missing", "${nope}")
            .with_parameter("literal", "plain value")];
        let id = create_workflow(&store, &steps).await;

        let params = HashMap::from([(
            "source_dir".to_string(),
            Value::String("/home/user/docs".into()),
        )]);
        let result = engine.execute(&id, params).await.unwrap();

        // NoopExecutor echoes the resolved parameters back.
        let echoed = &result.results["s1"]["parameters"];
        assert_eq!(echoed["source"], "/home/user/docs");
        assert_eq!(echoed["missing"], "${nope}");
        assert_eq!(echoed["literal"], "plain value");
    }

    #[tokio::test]
    async fn step_results_feed_later_templates() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let steps = [
            Step::new("first", StepKind::Command, "produce").with_next("second"),
            Step::new("second", StepKind::Command, "consume")
                .with_parameter("input", "${first}"),
        ];
        let id = create_workflow(&store, &steps).await;

        let result = engine.execute(&id, HashMap::new()).await.unwrap();
        let echoed = &result.results["second"]["parameters"]["input"];
        assert_eq!(echoed["action"], "produce");
        assert_eq!(echoed["status"], "executed");
    }

    #[tokio::test]
    async fn cyclic_chain_aborts_at_exactly_the_step_bound() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let steps = [
            Step::new("a", StepKind::Command, "ping").with_next("b"),
            Step::new("b", StepKind::Command, "pong").with_next("a"),
        ];
        let id = create_workflow(&store, &steps).await;

        let result = engine.execute(&id, HashMap::new()).await.unwrap();
        assert_eq!(result.status, ExecutionStatus::Aborted);
        assert_eq!(result.steps_executed, MAX_STEPS);
    }

    #[tokio::test]
    async fn executor_failure_aborts_with_partial_results() {
        let executors = Executors::new(
            Arc::new(NoopExecutor::new("cmd", ExecutorKind::Command)),
            Arc::new(FailingExecutor),
            Arc::new(NoopExecutor::new("app", ExecutorKind::AppOperation)),
        );
        let (engine, store) = setup_engine(executors).await;
        let steps = [
            Step::new("ok", StepKind::Command, "fine").with_next("boom"),
            Step::new("boom", StepKind::FileOperation, "copy").with_next("never"),
            Step::new("never", StepKind::Command, "unreached"),
        ];
        let id = create_workflow(&store, &steps).await;

        let err = engine.execute(&id, HashMap::new()).await.unwrap_err();
        match err {
            WorkflowError::StepFailed {
                step_id,
                steps_executed,
                results,
                ..
            } => {
                assert_eq!(step_id, "boom");
                assert_eq!(steps_executed, 1);
                assert!(results.contains_key("ok"));
                assert!(!results.contains_key("boom"));
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_stops_at_the_next_step_boundary() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let steps = [
            Step::new("slow", StepKind::Delay, "wait")
                .with_parameter("duration", 0.3)
                .with_next("after"),
            Step::new("after", StepKind::Command, "unreached"),
        ];
        let id = create_workflow(&store, &steps).await;

        let token = CancelToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let result = engine
            .execute_with_token(&id, HashMap::new(), token)
            .await
            .unwrap();
        assert_eq!(result.status, ExecutionStatus::Aborted);
        assert_eq!(result.steps_executed, 1);
        assert!(!result.results.contains_key("after"));
    }

    #[tokio::test]
    async fn concurrent_runs_have_isolated_contexts() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let steps = [Step::new("s", StepKind::Command, "echo")
            .with_parameter("who", "${caller}")];
        let id = create_workflow(&store, &steps).await;
        let engine = Arc::new(engine);

        let mut handles = Vec::new();
        for caller in ["alpha", "beta", "gamma"] {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let params =
                    HashMap::from([("caller".to_string(), Value::String(caller.to_string()))]);
                (caller, engine.execute(&id, params).await.unwrap())
            }));
        }

        for handle in handles {
            let (caller, result) = handle.await.unwrap();
            assert_eq!(result.results["s"]["parameters"]["who"], caller);
        }
    }

    #[tokio::test]
    async fn cancel_all_flags_in_flight_runs() {
        let (engine, store) = setup_engine(noop_executors()).await;
        let steps = [
            Step::new("slow", StepKind::Delay, "wait")
                .with_parameter("duration", 0.3)
                .with_next("after"),
            Step::new("after", StepKind::Command, "unreached"),
        ];
        let id = create_workflow(&store, &steps).await;
        let engine = Arc::new(engine);

        let run = {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            tokio::spawn(async move { engine.execute(&id, HashMap::new()).await })
        };

        // Let the run enter its delay step, then cancel everything.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(engine.active_count(), 1);
        engine.cancel_all();

        let result = run.await.unwrap().unwrap();
        assert_eq!(result.status, ExecutionStatus::Aborted);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn template_key_only_matches_whole_strings() {
        assert_eq!(template_key(&Value::String("${key}".into())), Some("key"));
        assert_eq!(template_key(&Value::String("prefix ${key}".into())), None);
        assert_eq!(template_key(&Value::String("${key} suffix".into())), None);
        assert_eq!(template_key(&json!(42)), None);
    }
}
