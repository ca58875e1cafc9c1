//! Intent classification and command dispatch for Vocalis.
//!
//! This crate provides:
//!
//! - **Intent classification**: ordered-rule pattern matching with a
//!   total-function fallback via [`classifier::IntentClassifier`].
//! - **Command dispatch**: keyword-priority routing of free-form command
//!   strings to executor categories via [`dispatcher::CommandDispatcher`],
//!   with an always-respond contract suitable for voice pipelines.

pub mod classifier;
pub mod dispatcher;
pub mod error;

pub use classifier::{
    EntityExtractor, IntentClassifier, IntentResult, IntentRule, default_rules,
};
pub use dispatcher::{CommandCapability, CommandDispatcher, CommandResult};
pub use error::{IntentError, Result};
