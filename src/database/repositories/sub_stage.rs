//! SeaORM sub-stage repository implementation
//!
//! Mirrors the stage repository one level down, scoped to a single stage.
//! There is no protected name and no reorder at this level: sub-stage
//! ordering is fixed at creation time (insert-at-end only).

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::pipeline::sub_stage_from_model;
use crate::entities::{prelude::*, sub_stages};
use crate::errors::{PipelineError, PipelineResult, is_unique_violation};
use crate::models::SubStage;

/// SeaORM-based sub-stage repository
#[derive(Clone)]
pub struct SubStageSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl SubStageSeaOrmRepository {
    /// Create a new SubStageSeaOrmRepository
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Add a sub-stage under a stage at the next order slot
    ///
    /// Name uniqueness is scoped to the owning stage: two different stages
    /// can each carry a sub-stage with the same name.
    pub async fn create(
        &self,
        stage_id: &Uuid,
        name: &str,
        description: Option<String>,
    ) -> PipelineResult<SubStage> {
        let name = validated_name(name)?;

        let txn = self.connection.begin().await?;

        Stages::find_by_id(*stage_id)
            .one(&txn)
            .await?
            .ok_or_else(|| PipelineError::not_found("stage", stage_id))?;

        let duplicate = SubStages::find()
            .filter(sub_stages::Column::StageId.eq(*stage_id))
            .filter(sub_stages::Column::Name.eq(&name))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(PipelineError::DuplicateSubStageName { name });
        }

        let top = SubStages::find()
            .filter(sub_stages::Column::StageId.eq(*stage_id))
            .order_by_desc(sub_stages::Column::StageOrder)
            .one(&txn)
            .await?;
        let next_order = top.map(|m| m.stage_order).unwrap_or(0) + 1;
        let now = chrono::Utc::now();

        let active_model = sub_stages::ActiveModel {
            id: Set(Uuid::new_v4()),
            stage_id: Set(*stage_id),
            name: Set(name.clone()),
            description: Set(description),
            stage_order: Set(next_order),
            is_completed: Set(false),
            completed_at: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = match active_model.insert(&txn).await {
            Ok(m) => m,
            Err(e) if is_unique_violation(&e) => {
                return Err(PipelineError::DuplicateSubStageName { name });
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;
        debug!("Added sub-stage '{}' at order {}", model.name, next_order);

        Ok(sub_stage_from_model(model))
    }

    /// Rename a sub-stage (uniqueness check excludes the record itself)
    pub async fn rename(&self, sub_stage_id: &Uuid, new_name: &str) -> PipelineResult<SubStage> {
        let new_name = validated_name(new_name)?;

        let txn = self.connection.begin().await?;

        let model = SubStages::find_by_id(*sub_stage_id)
            .one(&txn)
            .await?
            .ok_or_else(|| PipelineError::not_found("sub-stage", sub_stage_id))?;

        let duplicate = SubStages::find()
            .filter(sub_stages::Column::StageId.eq(model.stage_id))
            .filter(sub_stages::Column::Name.eq(&new_name))
            .filter(sub_stages::Column::Id.ne(model.id))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(PipelineError::DuplicateSubStageName { name: new_name });
        }

        let mut active_model: sub_stages::ActiveModel = model.into();
        active_model.name = Set(new_name.clone());
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = match active_model.update(&txn).await {
            Ok(m) => m,
            Err(e) if is_unique_violation(&e) => {
                return Err(PipelineError::DuplicateSubStageName { name: new_name });
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;

        Ok(sub_stage_from_model(updated))
    }

    /// Set the active flag unconditionally (idempotent)
    pub async fn set_active(
        &self,
        sub_stage_id: &Uuid,
        is_active: bool,
    ) -> PipelineResult<SubStage> {
        let model = SubStages::find_by_id(*sub_stage_id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| PipelineError::not_found("sub-stage", sub_stage_id))?;

        let mut active_model: sub_stages::ActiveModel = model.into();
        active_model.is_active = Set(is_active);
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = active_model.update(&*self.connection).await?;
        Ok(sub_stage_from_model(updated))
    }

    /// Mark a sub-stage completed, stamping the completion date
    pub async fn complete(
        &self,
        sub_stage_id: &Uuid,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> PipelineResult<SubStage> {
        let model = SubStages::find_by_id(*sub_stage_id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| PipelineError::not_found("sub-stage", sub_stage_id))?;

        let mut active_model: sub_stages::ActiveModel = model.into();
        active_model.is_completed = Set(true);
        active_model.completed_at = Set(Some(completed_at.unwrap_or_else(chrono::Utc::now)));
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = active_model.update(&*self.connection).await?;
        Ok(sub_stage_from_model(updated))
    }

    /// Find sub-stage by ID
    pub async fn find_by_id(&self, sub_stage_id: &Uuid) -> PipelineResult<Option<SubStage>> {
        let model = SubStages::find_by_id(*sub_stage_id)
            .one(&*self.connection)
            .await?;
        Ok(model.map(sub_stage_from_model))
    }

    /// List a stage's sub-stages in order
    pub async fn list_for_stage(&self, stage_id: &Uuid) -> PipelineResult<Vec<SubStage>> {
        let models = SubStages::find()
            .filter(sub_stages::Column::StageId.eq(*stage_id))
            .order_by_asc(sub_stages::Column::StageOrder)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(sub_stage_from_model).collect())
    }
}

fn validated_name(name: &str) -> PipelineResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::validation("Sub-stage name must not be empty"));
    }
    Ok(trimmed.to_string())
}
