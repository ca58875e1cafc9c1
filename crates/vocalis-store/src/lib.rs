//! # vocalis-store
//!
//! Workflow persistence for Vocalis.
//!
//! SQLite-backed storage with WAL mode, versioned migrations, and a
//! single-connection handle that keeps workflow reads consistent with
//! concurrent writes.  Step definitions are stored as JSON; the typed
//! workflow model lives in `vocalis-workflow` and converts at the edge.

pub mod db;
pub mod error;
pub mod migration;
pub mod workflow_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use workflow_store::{StoredWorkflow, WorkflowStore};
