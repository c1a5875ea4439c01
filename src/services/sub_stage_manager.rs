//! Sub-stage manager service
//!
//! The stage manager's mirror one level down, scoped to a single stage.
//! Deliberately narrower: no reorder and no protected name exist at this
//! level.

use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::database::repositories::SubStageSeaOrmRepository;
use crate::errors::PipelineResult;
use crate::models::SubStage;

/// Service for managing sub-stages within a stage
pub struct SubStageManagerService {
    sub_stage_repo: SubStageSeaOrmRepository,
}

impl SubStageManagerService {
    /// Create a new sub-stage manager service
    pub fn new(database: &Database) -> Self {
        Self {
            sub_stage_repo: SubStageSeaOrmRepository::new(database.connection()),
        }
    }

    /// Add a sub-stage at the end of a stage
    pub async fn add_sub_stage(
        &self,
        stage_id: &Uuid,
        name: &str,
        description: Option<String>,
    ) -> PipelineResult<SubStage> {
        let sub_stage = self.sub_stage_repo.create(stage_id, name, description).await?;
        info!(
            "Added sub-stage '{}' (order {}) to stage {}",
            sub_stage.name, sub_stage.order, stage_id
        );
        Ok(sub_stage)
    }

    /// Rename a sub-stage
    pub async fn rename_sub_stage(
        &self,
        sub_stage_id: &Uuid,
        new_name: &str,
    ) -> PipelineResult<SubStage> {
        let sub_stage = self.sub_stage_repo.rename(sub_stage_id, new_name).await?;
        info!("Renamed sub-stage {} to '{}'", sub_stage_id, sub_stage.name);
        Ok(sub_stage)
    }

    /// Set a sub-stage's active flag
    pub async fn toggle_sub_stage_active(
        &self,
        sub_stage_id: &Uuid,
        is_active: bool,
    ) -> PipelineResult<SubStage> {
        self.sub_stage_repo.set_active(sub_stage_id, is_active).await
    }

    /// Mark a sub-stage completed (completion date defaults to now)
    pub async fn complete_sub_stage(
        &self,
        sub_stage_id: &Uuid,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> PipelineResult<SubStage> {
        let sub_stage = self.sub_stage_repo.complete(sub_stage_id, completed_at).await?;
        info!("Marked sub-stage {} completed", sub_stage_id);
        Ok(sub_stage)
    }
}
