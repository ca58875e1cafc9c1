//! Workflow analysis — complexity scoring, step optimization, duration
//! estimation, and optional AI suggestions.
//!
//! The analyzer is pure over its inputs except for the suggestion pass,
//! which delegates to an optional [`TextGenerator`] capability and degrades
//! to an empty list when the capability is absent or failing — analysis
//! itself never fails.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use vocalis_exec::TextGenerator;

use crate::model::{Step, StepKind};

/// Weight per step in the complexity score.
const WEIGHT_STEP: f64 = 0.1;

/// Weight per conditional step.
const WEIGHT_CONDITIONAL: f64 = 0.4;

/// Weight per external side effect (app or file operation).
const WEIGHT_EXTERNAL: f64 = 0.5;

/// Maximum number of AI suggestions returned.
const MAX_SUGGESTIONS: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The result of analyzing a step sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowAnalysis {
    /// Transient identifier for this analysis.
    pub workflow_id: String,
    /// The optimized step sequence.
    pub optimized_steps: Vec<Step>,
    /// Estimated execution time in seconds.
    pub estimated_duration: f64,
    /// Complexity score in `[0, 1]`.
    pub complexity_score: f64,
    /// AI-generated improvement suggestions (empty without a generator).
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Scores and optimizes workflow step sequences.
#[derive(Default)]
pub struct WorkflowAnalyzer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl WorkflowAnalyzer {
    /// Create an analyzer without a suggestion backend.
    pub fn new() -> Self {
        Self { generator: None }
    }

    /// Create an analyzer that asks `generator` for improvement suggestions.
    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Analyze a step sequence against an optional caller context.
    pub async fn analyze(
        &self,
        steps: &[Step],
        context: &HashMap<String, Value>,
    ) -> WorkflowAnalysis {
        let complexity_score = complexity_score(steps);
        let optimized_steps = optimize_steps(steps);
        let estimated_duration = estimate_duration(&optimized_steps);
        let suggestions = self.generate_suggestions(steps, context).await;

        debug!(
            steps = steps.len(),
            optimized = optimized_steps.len(),
            complexity = complexity_score,
            "workflow analyzed"
        );

        WorkflowAnalysis {
            workflow_id: format!("wf_{}", Uuid::now_v7()),
            optimized_steps,
            estimated_duration,
            complexity_score,
            suggestions,
        }
    }

    /// Ask the text-generation capability for improvement suggestions.
    ///
    /// Absent or failing generators degrade to an empty list; analysis must
    /// never fail on the suggestion path.
    async fn generate_suggestions(
        &self,
        steps: &[Step],
        _context: &HashMap<String, Value>,
    ) -> Vec<String> {
        let Some(generator) = &self.generator else {
            return Vec::new();
        };

        let steps_json = serde_json::to_string(steps).unwrap_or_else(|_| "[]".into());
        let prompt = format!(
            "Analyze this workflow with {} steps and suggest improvements: {steps_json}",
            steps.len()
        );

        match generator.complete(&prompt).await {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .take(MAX_SUGGESTIONS)
                .map(String::from)
                .collect(),
            Err(e) => {
                warn!(error = %e, "suggestion generation failed");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring and optimization
// ---------------------------------------------------------------------------

/// Compute the complexity score for a step sequence.
///
/// `min(1.0, 0.1·steps + 0.4·conditionals + 0.5·external)`, rounded to two
/// decimals.  Conditionals and external side effects are deliberately
/// weighted far above plain sequencing; the relative weights and the clamp
/// are compatibility-critical.
pub fn complexity_score(steps: &[Step]) -> f64 {
    let conditionals = steps
        .iter()
        .filter(|s| s.kind == StepKind::Condition)
        .count();
    let external = steps
        .iter()
        .filter(|s| matches!(s.kind, StepKind::AppOperation | StepKind::FileOperation))
        .count();

    let score = (steps.len() as f64) * WEIGHT_STEP
        + (conditionals as f64) * WEIGHT_CONDITIONAL
        + (external as f64) * WEIGHT_EXTERNAL;

    (score.min(1.0) * 100.0).round() / 100.0
}

/// Merge adjacent file operations pairwise, left to right.
///
/// Greedy and non-reordering: only two *adjacent* file-operation steps
/// collapse into one `batch_operation` step; three in a row yield one
/// merged pair plus a singleton, never a triple merge.
pub fn optimize_steps(steps: &[Step]) -> Vec<Step> {
    let mut optimized = Vec::with_capacity(steps.len());
    let mut i = 0;

    while i < steps.len() {
        let current = &steps[i];
        if current.kind == StepKind::FileOperation
            && let Some(next) = steps.get(i + 1)
            && next.kind == StepKind::FileOperation
        {
            optimized.push(merge_file_operations(current, next));
            i += 2;
        } else {
            optimized.push(current.clone());
            i += 1;
        }
    }

    optimized
}

/// Combine two file operations into one batch step carrying both originals.
fn merge_file_operations(first: &Step, second: &Step) -> Step {
    let mut parameters = HashMap::new();
    parameters.insert(
        "operations".to_string(),
        json!([
            serde_json::to_value(first).unwrap_or(Value::Null),
            serde_json::to_value(second).unwrap_or(Value::Null),
        ]),
    );
    parameters.insert(
        "description".to_string(),
        Value::String(format!("Merged {} and {}", first.action, second.action)),
    );

    Step {
        id: format!("{}_merged", first.id),
        kind: StepKind::FileOperation,
        action: "batch_operation".into(),
        parameters,
        next_step: second.next_step.clone(),
    }
}

/// Estimate execution time in seconds with a fixed per-kind cost model.
///
/// Delay steps contribute their configured `duration`; everything else a
/// small constant.  Deterministic so analysis stays reproducible.
pub fn estimate_duration(steps: &[Step]) -> f64 {
    steps
        .iter()
        .map(|step| match step.kind {
            StepKind::Delay => step
                .parameters
                .get("duration")
                .and_then(Value::as_f64)
                .unwrap_or(1.0),
            StepKind::Command => 0.5,
            StepKind::FileOperation => 1.0,
            StepKind::AppOperation => 1.5,
            StepKind::Condition => 0.1,
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vocalis_exec::ExecError;

    fn file_op(id: &str) -> Step {
        Step::new(id, StepKind::FileOperation, "copy")
    }

    #[test]
    fn complexity_of_empty_sequence_is_zero() {
        assert_eq!(complexity_score(&[]), 0.0);
    }

    #[test]
    fn complexity_weights_are_preserved() {
        // 3 plain commands: 0.3
        let steps: Vec<Step> = (0..3)
            .map(|i| Step::new(format!("s{i}"), StepKind::Command, "x"))
            .collect();
        assert_eq!(complexity_score(&steps), 0.3);

        // 1 conditional alone: 0.1 + 0.4
        let steps = vec![Step::new("c", StepKind::Condition, "check")];
        assert_eq!(complexity_score(&steps), 0.5);

        // 1 external alone: 0.1 + 0.5
        let steps = vec![Step::new("f", StepKind::FileOperation, "copy")];
        assert_eq!(complexity_score(&steps), 0.6);
    }

    #[test]
    fn complexity_clamps_to_one() {
        // 5 steps, 1 conditional, 2 external: min(1, 0.5 + 0.4 + 1.0) = 1.0
        let steps = vec![
            Step::new("1", StepKind::Command, "x"),
            Step::new("2", StepKind::Condition, "check"),
            Step::new("3", StepKind::FileOperation, "copy"),
            Step::new("4", StepKind::AppOperation, "launch"),
            Step::new("5", StepKind::Command, "y"),
        ];
        assert_eq!(complexity_score(&steps), 1.0);
    }

    #[test]
    fn complexity_is_monotonic_in_step_count() {
        let mut steps = Vec::new();
        let mut last = 0.0;
        for i in 0..12 {
            steps.push(Step::new(format!("s{i}"), StepKind::Command, "x"));
            let score = complexity_score(&steps);
            assert!(score >= last);
            assert!(score <= 1.0);
            last = score;
        }
    }

    #[test]
    fn adjacent_pair_merges_once() {
        let steps = vec![file_op("a"), file_op("b")];
        let optimized = optimize_steps(&steps);
        assert_eq!(optimized.len(), 1);
        assert_eq!(optimized[0].id, "a_merged");
        assert_eq!(optimized[0].action, "batch_operation");
        let ops = optimized[0].parameters["operations"].as_array().unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0]["id"], "a");
        assert_eq!(ops[1]["id"], "b");
    }

    #[test]
    fn three_in_a_row_yield_pair_plus_singleton() {
        let steps = vec![file_op("a"), file_op("b"), file_op("c")];
        let optimized = optimize_steps(&steps);
        assert_eq!(optimized.len(), 2);
        assert_eq!(optimized[0].id, "a_merged");
        assert_eq!(optimized[1].id, "c");
        assert_eq!(optimized[1].action, "copy");
    }

    #[test]
    fn mixed_kinds_are_left_untouched() {
        let steps = vec![
            file_op("a"),
            Step::new("cmd", StepKind::Command, "date"),
            file_op("b"),
        ];
        let optimized = optimize_steps(&steps);
        assert_eq!(optimized.len(), 3);
        assert_eq!(optimized[0].id, "a");
        assert_eq!(optimized[2].id, "b");
    }

    #[test]
    fn optimization_never_reorders() {
        let steps = vec![
            Step::new("cmd", StepKind::Command, "date"),
            file_op("a"),
            file_op("b"),
            Step::new("app", StepKind::AppOperation, "launch"),
        ];
        let optimized = optimize_steps(&steps);
        let ids: Vec<&str> = optimized.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["cmd", "a_merged", "app"]);
    }

    #[test]
    fn duration_counts_delay_parameters() {
        let steps = vec![
            Step::new("d", StepKind::Delay, "wait").with_parameter("duration", 4.5),
            Step::new("c", StepKind::Command, "date"),
        ];
        assert_eq!(estimate_duration(&steps), 5.0);
    }

    #[tokio::test]
    async fn analysis_without_generator_has_empty_suggestions() {
        let analyzer = WorkflowAnalyzer::new();
        let steps = vec![file_op("a")];
        let analysis = analyzer.analyze(&steps, &HashMap::new()).await;
        assert!(analysis.suggestions.is_empty());
        assert!(analysis.workflow_id.starts_with("wf_"));
        assert_eq!(analysis.complexity_score, 0.6);
    }

    struct CannedGenerator;

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn complete(&self, _prompt: &str) -> vocalis_exec::Result<String> {
            Ok("first suggestion\n\nsecond suggestion\nthird\nfourth\nfifth\nsixth".into())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl TextGenerator for BrokenGenerator {
        async fn complete(&self, _prompt: &str) -> vocalis_exec::Result<String> {
            Err(ExecError::Internal("model offline".into()))
        }
    }

    #[tokio::test]
    async fn suggestions_are_capped_and_trimmed() {
        let analyzer = WorkflowAnalyzer::with_generator(Arc::new(CannedGenerator));
        let analysis = analyzer.analyze(&[file_op("a")], &HashMap::new()).await;
        assert_eq!(analysis.suggestions.len(), 5);
        assert_eq!(analysis.suggestions[0], "first suggestion");
    }

    #[tokio::test]
    async fn generator_failure_degrades_to_empty() {
        let analyzer = WorkflowAnalyzer::with_generator(Arc::new(BrokenGenerator));
        let analysis = analyzer.analyze(&[file_op("a")], &HashMap::new()).await;
        assert!(analysis.suggestions.is_empty());
    }
}
