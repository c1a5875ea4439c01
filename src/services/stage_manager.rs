//! Stage manager service
//!
//! Orchestrates all stage-level mutations for one pipeline: creation with
//! catalog seeding, add/rename/toggle, full reorders, bulk notes, and
//! completion stamping.

use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::database::repositories::{
    PipelineSeaOrmRepository, StageSeaOrmRepository, StatusCatalogSeaOrmRepository,
};
use crate::errors::PipelineResult;
use crate::models::{
    Pipeline, PipelineCreateRequest, Stage, StageNotesAssignment, StageOrderAssignment,
};

/// Service for managing pipelines and their stages
pub struct StageManagerService {
    pipeline_repo: PipelineSeaOrmRepository,
    stage_repo: StageSeaOrmRepository,
    catalog_repo: StatusCatalogSeaOrmRepository,
}

impl StageManagerService {
    /// Create a new stage manager service
    pub fn new(database: &Database) -> Self {
        Self {
            pipeline_repo: PipelineSeaOrmRepository::new(database.connection()),
            stage_repo: StageSeaOrmRepository::new(database.connection()),
            catalog_repo: StatusCatalogSeaOrmRepository::new(database.connection()),
        }
    }

    /// Create the pipeline for a country, seeded from the status catalog
    ///
    /// The catalog is snapshotted here and passed by value: stages copy the
    /// template names, so later catalog edits never touch existing stages.
    pub async fn create_pipeline(
        &self,
        request: PipelineCreateRequest,
    ) -> PipelineResult<Pipeline> {
        info!("Creating pipeline for country {}", request.country_id);

        let catalog = self.catalog_repo.list_ordered().await?;
        let pipeline = self.pipeline_repo.create(request, &catalog).await?;

        info!(
            "Successfully created pipeline {} for country {}",
            pipeline.id, pipeline.country_id
        );
        Ok(pipeline)
    }

    /// Add a stage at the end of a pipeline
    pub async fn add_stage(&self, pipeline_id: &Uuid, name: &str) -> PipelineResult<Stage> {
        let stage = self.stage_repo.create(pipeline_id, name).await?;
        info!(
            "Added stage '{}' (order {}) to pipeline {}",
            stage.name, stage.order, pipeline_id
        );
        Ok(stage)
    }

    /// Rename a stage (the protected stage always refuses)
    pub async fn rename_stage(&self, stage_id: &Uuid, new_name: &str) -> PipelineResult<Stage> {
        let stage = self.stage_repo.rename(stage_id, new_name).await?;
        info!("Renamed stage {} to '{}'", stage_id, stage.name);
        Ok(stage)
    }

    /// Set a stage's active flag
    pub async fn toggle_stage_active(
        &self,
        stage_id: &Uuid,
        is_active: bool,
    ) -> PipelineResult<Stage> {
        self.stage_repo.set_active(stage_id, is_active).await
    }

    /// Apply a full id-keyed renumbering of a pipeline's stages
    pub async fn reorder_stages(
        &self,
        pipeline_id: &Uuid,
        assignments: &[StageOrderAssignment],
    ) -> PipelineResult<()> {
        self.stage_repo.reorder(pipeline_id, assignments).await?;
        info!("Reordered stages of pipeline {}", pipeline_id);
        Ok(())
    }

    /// Bulk-overwrite stage notes, keyed by stage id
    pub async fn set_stage_notes(
        &self,
        pipeline_id: &Uuid,
        assignments: &[StageNotesAssignment],
    ) -> PipelineResult<()> {
        self.stage_repo.set_notes(pipeline_id, assignments).await
    }

    /// Stamp a stage's completion date (defaults to now)
    pub async fn complete_stage(
        &self,
        stage_id: &Uuid,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> PipelineResult<Stage> {
        let stage = self.stage_repo.complete(stage_id, completed_at).await?;
        info!("Marked stage {} completed", stage_id);
        Ok(stage)
    }

    /// Clear a stage's completion date
    pub async fn reopen_stage(&self, stage_id: &Uuid) -> PipelineResult<Stage> {
        let stage = self.stage_repo.reopen(stage_id).await?;
        info!("Reopened stage {}", stage_id);
        Ok(stage)
    }

    /// Soft-activate or soft-deactivate a whole pipeline
    pub async fn set_pipeline_active(
        &self,
        pipeline_id: &Uuid,
        is_active: bool,
    ) -> PipelineResult<Pipeline> {
        let pipeline = self.pipeline_repo.set_active(pipeline_id, is_active).await?;
        info!(
            "Pipeline {} is now {}",
            pipeline_id,
            if is_active { "active" } else { "inactive" }
        );
        Ok(pipeline)
    }
}
