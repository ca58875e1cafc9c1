//! Workflow data model.
//!
//! A workflow is an ordered sequence of typed steps forming a singly-linked
//! chain via `next_step` id references.  The first step is the entry point;
//! a step without `next_step` terminates the chain.  Chains are validated
//! for referential integrity at creation time but deliberately *not* for
//! acyclicity — the engine's runtime step bound is the cycle guard, so a
//! cycle only produces a warning here.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use vocalis_store::StoredWorkflow;

use crate::error::{Result, WorkflowError};

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// The kind of work a step performs.
///
/// A closed enum rather than free-form "type" strings: adding a kind is a
/// compile-time-checked change, and the engine matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// A raw system command, handled by the command executor.
    Command,
    /// A file operation (copy, move, delete, backup, search).
    FileOperation,
    /// An application operation (launch, close).
    AppOperation,
    /// A pure pause; suspends for `parameters.duration` seconds.
    Delay,
    /// A conditional marker; weighs into complexity scoring.
    Condition,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::FileOperation => write!(f, "file_operation"),
            Self::AppOperation => write!(f, "app_operation"),
            Self::Delay => write!(f, "delay"),
            Self::Condition => write!(f, "condition"),
        }
    }
}

/// One unit of work in a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Identifier, unique within the owning workflow.
    pub id: String,
    /// What kind of action this step performs.
    #[serde(rename = "type")]
    pub kind: StepKind,
    /// The action to invoke on the step's executor.
    pub action: String,
    /// Action parameters.  String values of the exact form `${key}` are
    /// resolved against the execution context at run time.
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    /// The id of the step to run next; `None` terminates the chain.
    #[serde(rename = "nextStep", default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

impl Step {
    /// Create a step with no parameters and no successor.
    pub fn new(id: impl Into<String>, kind: StepKind, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            action: action.into(),
            parameters: HashMap::new(),
            next_step: None,
        }
    }

    /// Set a parameter value.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Set the successor step id.
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next_step = Some(next.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// How a workflow is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Started explicitly by the user or an API call.
    Manual,
    /// Started from a recognized voice command.
    Voice,
    /// Started by a schedule owned by the embedding host.
    Scheduled,
}

impl Default for TriggerKind {
    fn default() -> Self {
        Self::Manual
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Voice => write!(f, "voice"),
            Self::Scheduled => write!(f, "scheduled"),
        }
    }
}

impl std::str::FromStr for TriggerKind {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "manual" => Ok(Self::Manual),
            "voice" => Ok(Self::Voice),
            "scheduled" => Ok(Self::Scheduled),
            other => Err(WorkflowError::InvalidDefinition {
                reason: format!("unknown trigger type: `{other}`"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A complete workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Ordered step sequence; `steps[0]` is the entry point.
    pub steps: Vec<Step>,
    /// How this workflow is triggered.
    pub trigger: TriggerKind,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of the last update.
    pub updated_at: i64,
}

impl Workflow {
    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }
}

impl TryFrom<StoredWorkflow> for Workflow {
    type Error = WorkflowError;

    fn try_from(stored: StoredWorkflow) -> Result<Self> {
        let steps: Vec<Step> =
            serde_json::from_value(stored.steps).map_err(|e| WorkflowError::InvalidDefinition {
                reason: format!("stored steps are malformed: {e}"),
            })?;
        let trigger: TriggerKind = stored.trigger_type.parse()?;

        Ok(Self {
            id: stored.id,
            name: stored.name,
            description: stored.description,
            steps,
            trigger,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a step sequence's structural invariants.
///
/// Rejects duplicate step ids and `next_step` references that do not
/// resolve to an existing step.  A cyclic chain is accepted — the engine's
/// 100-step bound guards against runaway execution — but logged, since it
/// is almost always an authoring mistake.
pub fn validate_steps(steps: &[Step]) -> Result<()> {
    let mut ids = HashSet::new();
    for step in steps {
        if !ids.insert(step.id.as_str()) {
            return Err(WorkflowError::InvalidDefinition {
                reason: format!("duplicate step id: `{}`", step.id),
            });
        }
    }

    for step in steps {
        if let Some(next) = &step.next_step
            && !ids.contains(next.as_str())
        {
            return Err(WorkflowError::InvalidDefinition {
                reason: format!("step `{}` references unknown next step `{next}`", step.id),
            });
        }
    }

    if let Some(cycle_start) = detect_cycle(steps) {
        warn!(
            step_id = %cycle_start,
            "workflow step chain is cyclic; execution will stop at the step bound"
        );
    }

    Ok(())
}

/// Walk the chain from the entry point and report the first revisited step
/// id, if any.
fn detect_cycle(steps: &[Step]) -> Option<String> {
    let mut visited = HashSet::new();
    let mut current = steps.first();

    while let Some(step) = current {
        if !visited.insert(step.id.as_str()) {
            return Some(step.id.clone());
        }
        current = step
            .next_step
            .as_ref()
            .and_then(|next| steps.iter().find(|s| s.id == *next));
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
