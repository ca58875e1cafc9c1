//! Workflow persistence.
//!
//! Provides SQLite-backed CRUD operations for workflow definitions.  Step
//! sequences are stored as a JSON array and replaced wholesale on update —
//! a stored workflow is never partially mutated, so concurrent readers
//! always observe an internally consistent step list.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A persisted workflow definition.
///
/// Steps are kept as raw JSON here; the workflow crate owns the typed model
/// and converts on the way in and out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredWorkflow {
    /// Unique identifier (`wf_` + UUID v7).
    pub id: String,
    /// Human-readable workflow name.
    pub name: String,
    /// Optional description of what the workflow does.
    pub description: Option<String>,
    /// JSON array of step definitions.
    pub steps: serde_json::Value,
    /// How the workflow is triggered: `manual`, `voice`, or `scheduled`.
    pub trigger_type: String,
    /// Unix timestamp when the workflow was created.
    pub created_at: i64,
    /// Unix timestamp when the workflow was last updated.
    pub updated_at: i64,
}

// ---------------------------------------------------------------------------
// WorkflowStore
// ---------------------------------------------------------------------------

/// CRUD operations on workflow definitions.
#[derive(Clone)]
pub struct WorkflowStore {
    db: Database,
}

impl WorkflowStore {
    /// Create a new workflow store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new workflow and return the stored record.
    ///
    /// Generates a `wf_`-prefixed UUID v7 identifier — time-ordered and
    /// collision-resistant even across rapid calls with the same name —
    /// and sets both timestamps to now.
    #[instrument(skip(self, steps))]
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        steps: serde_json::Value,
        trigger_type: &str,
    ) -> StoreResult<StoredWorkflow> {
        let id = format!("wf_{}", Uuid::now_v7());
        let name = name.to_string();
        let description = description.map(|s| s.to_string());
        let trigger_type = trigger_type.to_string();
        let now = Utc::now().timestamp();

        let steps_json = serde_json::to_string(&steps)?;

        let workflow = StoredWorkflow {
            id: id.clone(),
            name: name.clone(),
            description: description.clone(),
            steps,
            trigger_type: trigger_type.clone(),
            created_at: now,
            updated_at: now,
        };

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO workflows (id, name, description, steps, trigger_type, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    rusqlite::params![id, name, description, steps_json, trigger_type, now],
                )?;
                Ok(())
            })
            .await?;

        debug!(workflow_id = %workflow.id, workflow_name = %workflow.name, "workflow created");
        Ok(workflow)
    }

    /// Fetch a single workflow by ID, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> StoreResult<Option<StoredWorkflow>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT id, name, description, steps, trigger_type, created_at, updated_at \
                     FROM workflows WHERE id = ?1",
                    rusqlite::params![id],
                    WorkflowRow::from_row,
                );
                match result {
                    Ok(row) => row.into_stored_workflow().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// List workflows ordered by most recently updated, with pagination.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<StoredWorkflow>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, description, steps, trigger_type, created_at, updated_at \
                     FROM workflows ORDER BY updated_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![limit, offset], WorkflowRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter().map(|r| r.into_stored_workflow()).collect()
            })
            .await
    }

    /// Replace a workflow's name, description, steps, and trigger.
    ///
    /// The step sequence is swapped atomically; `updated_at` is refreshed.
    #[instrument(skip(self, steps))]
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        steps: serde_json::Value,
        trigger_type: &str,
    ) -> StoreResult<()> {
        let id = id.to_string();
        let name = name.to_string();
        let description = description.map(|s| s.to_string());
        let trigger_type = trigger_type.to_string();
        let now = Utc::now().timestamp();

        let steps_json = serde_json::to_string(&steps)?;

        self.db
            .execute(move |conn| {
                let updated = conn.execute(
                    "UPDATE workflows SET name = ?2, description = ?3, steps = ?4, trigger_type = ?5, updated_at = ?6 \
                     WHERE id = ?1",
                    rusqlite::params![id, name, description, steps_json, trigger_type, now],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "workflow",
                        id,
                    });
                }
                Ok(())
            })
            .await
    }

    /// Delete a workflow by ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM workflows WHERE id = ?1", rusqlite::params![id])?;
                if deleted == 0 {
                    return Err(StoreError::NotFound {
                        entity: "workflow",
                        id,
                    });
                }
                Ok(())
            })
            .await
    }

    /// Return the total number of workflows.
    #[instrument(skip(self))]
    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM workflows", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Internal row mapping
// ---------------------------------------------------------------------------

/// Raw row data from SQLite before JSON deserialization.
///
/// Keeps the `rusqlite` row-mapping closure infallible (no JSON parsing
/// inside `|row| { ... }`), then converts to `StoredWorkflow` in a second
/// step where `StoreError::Json` can be returned.
struct WorkflowRow {
    id: String,
    name: String,
    description: Option<String>,
    steps: String,
    trigger_type: String,
    created_at: i64,
    updated_at: i64,
}

impl WorkflowRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            steps: row.get(3)?,
            trigger_type: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// Convert raw row strings into a fully deserialized `StoredWorkflow`.
    fn into_stored_workflow(self) -> StoreResult<StoredWorkflow> {
        let steps: serde_json::Value = serde_json::from_str(&self.steps)?;

        Ok(StoredWorkflow {
            id: self.id,
            name: self.name,
            description: self.description,
            steps,
            trigger_type: self.trigger_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ── tests ────────────────────────────────────────────────────────────
