//! Workflow model, analysis, and execution engine for Vocalis.
//!
//! This crate provides:
//!
//! - **Data model**: typed [`Step`]/[`Workflow`] definitions with
//!   creation-time validation via [`model`].
//! - **Analysis**: complexity scoring, adjacent-step optimization, duration
//!   estimation, and optional AI suggestions via
//!   [`analyzer::WorkflowAnalyzer`].
//! - **Execution**: sequential chain walking with template resolution,
//!   cooperative cancellation, and a hard step bound via
//!   [`engine::WorkflowEngine`].
//! - **Suggestion**: transcript keyword analysis via
//!   [`suggest::suggest_from_transcript`].

pub mod analyzer;
pub mod engine;
pub mod error;
pub mod model;
pub mod suggest;

pub use analyzer::{WorkflowAnalysis, WorkflowAnalyzer, complexity_score, optimize_steps};
pub use engine::{CancelToken, ExecutionResult, ExecutionStatus, MAX_STEPS, WorkflowEngine};
pub use error::{Result, WorkflowError};
pub use model::{Step, StepKind, TriggerKind, Workflow, validate_steps};
pub use suggest::{WorkflowSuggestion, suggest_from_transcript};
