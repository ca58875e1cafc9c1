//! Executor capability seams for Vocalis.
//!
//! This crate defines the boundary between the orchestration core and the
//! side-effecting world:
//!
//! - [`Executor`]: uniform action interface, one implementation per
//!   [`ExecutorKind`] (command / file operation / app operation), bundled
//!   into an [`Executors`] registry.
//! - [`TextGenerator`]: optional text-completion seam for suggestions.
//! - [`Transcriber`] / [`Transcript`]: speech-to-text boundary.
//! - [`ShellExecutor`]: the one concrete executor the core ships, backing
//!   raw command passthrough.
//! - [`NoopExecutor`]: acknowledge-only stand-in for absent collaborators.

pub mod error;
pub mod noop;
pub mod shell;
pub mod traits;

pub use error::{ExecError, Result};
pub use noop::NoopExecutor;
pub use shell::ShellExecutor;
pub use traits::{Executor, ExecutorKind, Executors, TextGenerator, Transcriber, Transcript};
