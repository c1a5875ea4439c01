//! Domain models for the pipeline engine
//!
//! These are the DTOs exchanged with callers. They are deliberately
//! decoupled from the SeaORM entity models: repositories map entity rows
//! into these types so the persistence layer can evolve independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the protected stage seeded into every pipeline.
///
/// The stage carrying this name can never be renamed, and no other stage
/// in the same pipeline may ever receive it.
pub const PROTECTED_STAGE_NAME: &str = "New";

/// The ordered process definition for one represented country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    /// One pipeline per country, enforced by a unique constraint
    pub country_id: Uuid,
    /// Free-text operational notes owned by the record-management layer
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One named, ordered step in a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    /// Positive, assigned max+1 on creation; dense 1..N after a reorder
    pub order: i32,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stage {
    /// Whether this is the protected seed stage
    pub fn is_protected(&self) -> bool {
        self.name == PROTECTED_STAGE_NAME
    }
}

/// One named, ordered step nested under a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubStage {
    pub id: Uuid,
    pub stage_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reusable stage-name template from the global status catalog
///
/// Catalog entries are copied by value (the name string) into stages at
/// pipeline creation and never synchronized afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCatalogEntry {
    pub id: Uuid,
    pub name: String,
    /// Display tag for the UI
    pub color: String,
    /// Catalog browsing order
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create the pipeline for a country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCreateRequest {
    pub country_id: Uuid,
    /// Catalog names to seed as stages, in caller order. The protected
    /// stage is always seeded first regardless of this list; unknown names
    /// are skipped.
    #[serde(default)]
    pub selected_catalog_names: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One (stage id, new order) pair in a reorder batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOrderAssignment {
    pub stage_id: Uuid,
    pub order: i32,
}

/// One (stage id, notes) pair in a bulk notes update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageNotesAssignment {
    pub stage_id: Uuid,
    pub notes: Option<String>,
}

/// A stage with its ordered sub-stages, as assembled by the projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageView {
    #[serde(flatten)]
    pub stage: Stage,
    /// Derived display hint: the first stage in order with no completion
    /// date. Never stored or transitioned by any mutation.
    pub is_current: bool,
    pub sub_stages: Vec<SubStage>,
}

/// A pipeline with its stages and sub-stages, ordered for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineView {
    #[serde(flatten)]
    pub pipeline: Pipeline,
    pub stages: Vec<StageView>,
}
