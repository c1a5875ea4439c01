//! SeaORM pipeline repository implementation
//!
//! Owns the pipeline aggregate: creation with stage seeding, lookup by id
//! and by country, soft activate/deactivate, and the ordered projection
//! used for display. Pipelines are never hard-deleted by the engine.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::entities::{pipelines, prelude::*, stages, sub_stages};
use crate::errors::{PipelineError, PipelineResult, is_unique_violation};
use crate::models::{
    PROTECTED_STAGE_NAME, Pipeline, PipelineCreateRequest, PipelineView, Stage, StageView,
    StatusCatalogEntry, SubStage,
};

/// SeaORM-based pipeline repository
#[derive(Clone)]
pub struct PipelineSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl PipelineSeaOrmRepository {
    /// Create a new PipelineSeaOrmRepository
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Create the pipeline for a country, seeding its stages
    ///
    /// The protected stage is always seeded at order 1, whether or not the
    /// caller selected it. Remaining selected catalog names are appended in
    /// caller order from order 2; names absent from the supplied catalog
    /// snapshot are skipped with a warning. Everything happens in one
    /// transaction so a failed seed never leaves a half-built pipeline.
    pub async fn create(
        &self,
        request: PipelineCreateRequest,
        catalog: &[StatusCatalogEntry],
    ) -> PipelineResult<Pipeline> {
        let txn = self.connection.begin().await?;

        let existing = Pipelines::find()
            .filter(pipelines::Column::CountryId.eq(request.country_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(PipelineError::DuplicatePipeline {
                country_id: request.country_id,
            });
        }

        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let active_model = pipelines::ActiveModel {
            id: Set(id),
            country_id: Set(request.country_id),
            notes: Set(request.notes.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = match active_model.insert(&txn).await {
            Ok(m) => m,
            // The unique index on country_id is the safety net against a
            // concurrent creator that passed the check above.
            Err(e) if is_unique_violation(&e) => {
                return Err(PipelineError::DuplicatePipeline {
                    country_id: request.country_id,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let known: HashSet<&str> = catalog.iter().map(|c| c.name.as_str()).collect();
        let mut seeded: Vec<String> = vec![PROTECTED_STAGE_NAME.to_string()];
        for name in &request.selected_catalog_names {
            // The protected stage is already first; reselecting it is a no-op
            if name == PROTECTED_STAGE_NAME || seeded.contains(name) {
                continue;
            }
            if !known.contains(name.as_str()) {
                warn!(
                    "Skipping unknown catalog status '{}' while seeding pipeline {}",
                    name, id
                );
                continue;
            }
            seeded.push(name.clone());
        }

        for (index, name) in seeded.iter().enumerate() {
            let stage = stages::ActiveModel {
                id: Set(Uuid::new_v4()),
                pipeline_id: Set(id),
                name: Set(name.clone()),
                stage_order: Set(index as i32 + 1),
                notes: Set(None),
                completed_at: Set(None),
                is_current: Set(false),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            };
            stage.insert(&txn).await?;
        }

        txn.commit().await?;

        Ok(pipeline_from_model(model))
    }

    /// Find pipeline by ID
    pub async fn find_by_id(&self, id: &Uuid) -> PipelineResult<Option<Pipeline>> {
        let model = Pipelines::find_by_id(*id).one(&*self.connection).await?;
        Ok(model.map(pipeline_from_model))
    }

    /// Find pipeline by country
    pub async fn find_by_country(&self, country_id: &Uuid) -> PipelineResult<Option<Pipeline>> {
        let model = Pipelines::find()
            .filter(pipelines::Column::CountryId.eq(*country_id))
            .one(&*self.connection)
            .await?;
        Ok(model.map(pipeline_from_model))
    }

    /// List all pipelines in creation order
    pub async fn list_all(&self) -> PipelineResult<Vec<Pipeline>> {
        let models = Pipelines::find()
            .order_by_asc(pipelines::Column::CreatedAt)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(pipeline_from_model).collect())
    }

    /// Soft-activate or soft-deactivate a pipeline (reversible; the engine
    /// never hard-deletes)
    pub async fn set_active(&self, id: &Uuid, is_active: bool) -> PipelineResult<Pipeline> {
        let model = Pipelines::find_by_id(*id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| PipelineError::not_found("pipeline", id))?;

        let mut active_model: pipelines::ActiveModel = model.into();
        active_model.is_active = Set(is_active);
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = active_model.update(&*self.connection).await?;
        Ok(pipeline_from_model(updated))
    }

    /// Assemble the display projection: stages ordered ascending, each with
    /// its sub-stages ordered ascending
    ///
    /// `is_current` is derived here, not read from storage: the first stage
    /// in order with no completion date is the current one.
    pub async fn get_view(&self, id: &Uuid) -> PipelineResult<PipelineView> {
        let pipeline = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| PipelineError::not_found("pipeline", id))?;
        self.assemble_view(pipeline).await
    }

    /// Assemble the display projection, resolved by country
    pub async fn get_view_by_country(&self, country_id: &Uuid) -> PipelineResult<PipelineView> {
        let pipeline = self
            .find_by_country(country_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("pipeline for country", country_id))?;
        self.assemble_view(pipeline).await
    }

    async fn assemble_view(&self, pipeline: Pipeline) -> PipelineResult<PipelineView> {
        let stage_models = Stages::find()
            .filter(stages::Column::PipelineId.eq(pipeline.id))
            .order_by_asc(stages::Column::StageOrder)
            .all(&*self.connection)
            .await?;

        let mut current_marked = false;
        let mut stage_views = Vec::with_capacity(stage_models.len());
        for m in stage_models {
            let sub_models = SubStages::find()
                .filter(sub_stages::Column::StageId.eq(m.id))
                .order_by_asc(sub_stages::Column::StageOrder)
                .all(&*self.connection)
                .await?;

            let stage = stage_from_model(m);
            let is_current = !current_marked && stage.completed_at.is_none();
            if is_current {
                current_marked = true;
            }
            stage_views.push(StageView {
                stage,
                is_current,
                sub_stages: sub_models.into_iter().map(sub_stage_from_model).collect(),
            });
        }

        Ok(PipelineView {
            pipeline,
            stages: stage_views,
        })
    }
}

fn pipeline_from_model(m: pipelines::Model) -> Pipeline {
    Pipeline {
        id: m.id,
        country_id: m.country_id,
        notes: m.notes,
        is_active: m.is_active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

pub(crate) fn stage_from_model(m: stages::Model) -> Stage {
    Stage {
        id: m.id,
        pipeline_id: m.pipeline_id,
        name: m.name,
        order: m.stage_order,
        notes: m.notes,
        completed_at: m.completed_at,
        is_active: m.is_active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

pub(crate) fn sub_stage_from_model(m: sub_stages::Model) -> SubStage {
    SubStage {
        id: m.id,
        stage_id: m.stage_id,
        name: m.name,
        description: m.description,
        order: m.stage_order,
        is_completed: m.is_completed,
        completed_at: m.completed_at,
        is_active: m.is_active,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::database::repositories::StatusCatalogSeaOrmRepository;

    async fn setup() -> Database {
        let db = Database::new_in_memory().await.expect("memory db");
        db.migrate().await.expect("migrations");
        db
    }

    fn request(country_id: Uuid, names: &[&str]) -> PipelineCreateRequest {
        PipelineCreateRequest {
            country_id,
            selected_catalog_names: names.iter().map(|n| n.to_string()).collect(),
            notes: None,
        }
    }

    async fn catalog(db: &Database) -> Vec<StatusCatalogEntry> {
        StatusCatalogSeaOrmRepository::new(db.connection())
            .list_ordered()
            .await
            .expect("catalog")
    }

    #[tokio::test]
    async fn test_create_seeds_protected_stage_first() {
        let db = setup().await;
        let repo = PipelineSeaOrmRepository::new(db.connection());
        let catalog = catalog(&db).await;

        let pipeline = repo
            .create(
                request(
                    Uuid::new_v4(),
                    &["New", "Document Review", "Visa Processing"],
                ),
                &catalog,
            )
            .await
            .expect("create pipeline");

        let view = repo.get_view(&pipeline.id).await.expect("view");
        let names: Vec<(&str, i32)> = view
            .stages
            .iter()
            .map(|s| (s.stage.name.as_str(), s.stage.order))
            .collect();
        assert_eq!(
            names,
            vec![("New", 1), ("Document Review", 2), ("Visa Processing", 3)]
        );
    }

    #[tokio::test]
    async fn test_create_deduplicates_selected_names() {
        let db = setup().await;
        let repo = PipelineSeaOrmRepository::new(db.connection());
        let catalog = catalog(&db).await;

        let pipeline = repo
            .create(
                request(
                    Uuid::new_v4(),
                    &["Document Review", "New", "Document Review"],
                ),
                &catalog,
            )
            .await
            .expect("create pipeline");

        let view = repo.get_view(&pipeline.id).await.expect("view");
        assert_eq!(view.stages.len(), 2);
        assert_eq!(view.stages[0].stage.name, "New");
        assert_eq!(view.stages[1].stage.name, "Document Review");
        let new_count = view
            .stages
            .iter()
            .filter(|s| s.stage.name == PROTECTED_STAGE_NAME)
            .count();
        assert_eq!(new_count, 1, "exactly one protected stage");
    }

    #[tokio::test]
    async fn test_create_skips_unknown_catalog_names() {
        let db = setup().await;
        let repo = PipelineSeaOrmRepository::new(db.connection());
        let catalog = catalog(&db).await;

        let pipeline = repo
            .create(
                request(Uuid::new_v4(), &["Not A Status", "Visa Processing"]),
                &catalog,
            )
            .await
            .expect("create pipeline");

        let view = repo.get_view(&pipeline.id).await.expect("view");
        let names: Vec<&str> = view.stages.iter().map(|s| s.stage.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Visa Processing"]);
    }

    #[tokio::test]
    async fn test_duplicate_pipeline_for_country_rejected() {
        let db = setup().await;
        let repo = PipelineSeaOrmRepository::new(db.connection());
        let catalog = catalog(&db).await;
        let country_id = Uuid::new_v4();

        repo.create(request(country_id, &[]), &catalog)
            .await
            .expect("first create");

        let second = repo.create(request(country_id, &[]), &catalog).await;
        assert!(matches!(
            second,
            Err(PipelineError::DuplicatePipeline { country_id: c }) if c == country_id
        ));
    }

    #[tokio::test]
    async fn test_set_active_is_reversible() {
        let db = setup().await;
        let repo = PipelineSeaOrmRepository::new(db.connection());
        let catalog = catalog(&db).await;

        let pipeline = repo
            .create(request(Uuid::new_v4(), &[]), &catalog)
            .await
            .expect("create");

        let deactivated = repo.set_active(&pipeline.id, false).await.expect("off");
        assert!(!deactivated.is_active);
        let restored = repo.set_active(&pipeline.id, true).await.expect("on");
        assert!(restored.is_active);
    }

    #[tokio::test]
    async fn test_get_view_unknown_pipeline_is_not_found() {
        let db = setup().await;
        let repo = PipelineSeaOrmRepository::new(db.connection());

        let result = repo.get_view(&Uuid::new_v4()).await;
        assert!(matches!(result, Err(PipelineError::NotFound { .. })));
    }
}
