//! Transcript-driven workflow suggestion.
//!
//! Keyword analysis of a voice transcript that proposes a workflow type and
//! a ready-made step template the user can create as-is or edit.  This is
//! deliberately simple phrase matching; anything smarter belongs behind the
//! text-generation seam.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::{Step, StepKind};

/// A suggested workflow derived from a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSuggestion {
    /// The inferred workflow type (e.g. "backup").
    pub workflow_type: String,
    /// Template steps for the suggested workflow.
    pub steps: Vec<Step>,
    /// Confidence of the inference.
    pub confidence: f64,
    /// Extracted entities.
    pub entities: HashMap<String, Value>,
}

/// Analyze a transcript and suggest a workflow.
///
/// Recognizes backup, file-organization, and work-setup phrasings; anything
/// else yields a generic "automation" suggestion with no template steps.
pub fn suggest_from_transcript(transcript: &str) -> WorkflowSuggestion {
    let lowered = transcript.to_lowercase();

    let (workflow_type, steps) = if lowered.contains("backup") {
        ("backup", backup_steps())
    } else if lowered.contains("organize") && lowered.contains("file") {
        ("file_organization", file_organization_steps())
    } else if lowered.contains("work setup") || lowered.contains("start work") {
        ("work_setup", work_setup_steps())
    } else {
        ("automation", Vec::new())
    };

    debug!(workflow_type, steps = steps.len(), "transcript analyzed");

    WorkflowSuggestion {
        workflow_type: workflow_type.to_string(),
        steps,
        confidence: 0.8,
        entities: HashMap::from([(
            "workflow_type".to_string(),
            Value::String(workflow_type.to_string()),
        )]),
    }
}

/// Compress a source directory, then copy the archive to a destination.
fn backup_steps() -> Vec<Step> {
    vec![
        Step::new("1", StepKind::FileOperation, "compress")
            .with_parameter("source", "${backup_source}")
            .with_parameter("format", "zip")
            .with_next("2"),
        Step::new("2", StepKind::FileOperation, "copy")
            .with_parameter("source", "${compressed_file}")
            .with_parameter("destination", "${backup_destination}"),
    ]
}

/// Categorize files by type, then move them into the organized layout.
fn file_organization_steps() -> Vec<Step> {
    vec![
        Step::new("1", StepKind::FileOperation, "categorize")
            .with_parameter("directory", "${target_directory}")
            .with_parameter("strategy", "file_type")
            .with_next("2"),
        Step::new("2", StepKind::FileOperation, "move")
            .with_parameter("files", "${categorized_files}")
            .with_parameter("destination", "${organized_directory}"),
    ]
}

/// Launch the standard work applications.
fn work_setup_steps() -> Vec<Step> {
    vec![
        Step::new("1", StepKind::AppOperation, "launch")
            .with_parameter("app_name", "slack")
            .with_next("2"),
        Step::new("2", StepKind::AppOperation, "launch")
            .with_parameter("app_name", "vscode")
            .with_next("3"),
        Step::new("3", StepKind::AppOperation, "launch").with_parameter("app_name", "chrome"),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::validate_steps;

    #[test]
    fn backup_phrase_suggests_backup_workflow() {
        let suggestion = suggest_from_transcript("please backup my documents folder");
        assert_eq!(suggestion.workflow_type, "backup");
        assert_eq!(suggestion.steps.len(), 2);
        assert_eq!(suggestion.steps[0].action, "compress");
        assert_eq!(suggestion.entities["workflow_type"], "backup");
    }

    #[test]
    fn organize_files_phrase_suggests_file_organization() {
        let suggestion = suggest_from_transcript("organize the files in my downloads");
        assert_eq!(suggestion.workflow_type, "file_organization");
        assert_eq!(suggestion.steps[1].action, "move");
    }

    #[test]
    fn work_setup_phrase_launches_apps() {
        let suggestion = suggest_from_transcript("run my start work routine");
        assert_eq!(suggestion.workflow_type, "work_setup");
        assert_eq!(suggestion.steps.len(), 3);
        assert!(suggestion
            .steps
            .iter()
            .all(|s| s.kind == StepKind::AppOperation));
    }

    #[test]
    fn unknown_transcript_falls_back_to_automation() {
        let suggestion = suggest_from_transcript("water the plants");
        assert_eq!(suggestion.workflow_type, "automation");
        assert!(suggestion.steps.is_empty());
    }

    #[test]
    fn suggested_templates_are_structurally_valid() {
        for transcript in ["backup now", "organize files", "start work"] {
            let suggestion = suggest_from_transcript(transcript);
            validate_steps(&suggestion.steps).unwrap();
        }
    }
}
