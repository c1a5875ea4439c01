//! Error type definitions for the pipeline engine
//!
//! Every recoverable condition the engine can report to a caller is a
//! variant of [`PipelineError`]. These are user-input-class errors: the
//! presentation layer is expected to map them to field-level messages and
//! ask for a corrected resubmission, never to retry automatically. Only
//! `Database` wraps storage failure and propagates unchanged.

use thiserror::Error;
use uuid::Uuid;

use crate::models::PROTECTED_STAGE_NAME;

/// Structured error taxonomy for all pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A pipeline already exists for the given country
    #[error("A pipeline already exists for country {country_id}")]
    DuplicatePipeline { country_id: Uuid },

    /// Stage name collision within the owning pipeline
    #[error("A stage named '{name}' already exists in this pipeline")]
    DuplicateStageName { name: String },

    /// Sub-stage name collision within the owning stage
    #[error("A sub-stage named '{name}' already exists in this stage")]
    DuplicateSubStageName { name: String },

    /// Attempt to rename the protected stage
    #[error("The '{}' stage cannot be renamed", PROTECTED_STAGE_NAME)]
    ProtectedStageRename,

    /// Attempt to create or rename another stage to the protected name
    #[error("'{}' is a reserved stage name", PROTECTED_STAGE_NAME)]
    ProtectedNameConflict,

    /// Referenced pipeline/stage/sub-stage does not exist
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: &'static str, id: String },

    /// Malformed input (empty name, non-positive order, inconsistent batch)
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Storage-level errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl PipelineError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error for a resource/id pair
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Detect whether a database error corresponds to a unique-constraint
/// violation. SeaORM does not expose constraint names uniformly across
/// SQLite, PostgreSQL, and MySQL, so we fall back to a string match on the
/// formatted error rather than depending on internal variant shapes.
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    let m = err.to_string().to_lowercase();
    m.contains("unique") || m.contains("duplicate")
}
