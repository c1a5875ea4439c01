//! SeaORM stage repository implementation
//!
//! Enforces the stage-level invariants: name uniqueness per pipeline, the
//! protected seed stage that can never be renamed or duplicated, and
//! monotonic order assignment. Batch operations (reorder, bulk notes) are
//! all-or-nothing inside one transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::pipeline::stage_from_model;
use crate::entities::{prelude::*, stages};
use crate::errors::{PipelineError, PipelineResult, is_unique_violation};
use crate::models::{PROTECTED_STAGE_NAME, Stage, StageNotesAssignment, StageOrderAssignment};

/// SeaORM-based stage repository
#[derive(Clone)]
pub struct StageSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl StageSeaOrmRepository {
    /// Create a new StageSeaOrmRepository
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Add a stage to a pipeline at the next order slot
    ///
    /// Order is max(existing) + 1, so a new stage always lands strictly
    /// after every pre-existing one. The protected name is rejected
    /// outright; sibling duplicates are rejected first by the
    /// in-transaction check and, under a race, by the unique index.
    pub async fn create(&self, pipeline_id: &Uuid, name: &str) -> PipelineResult<Stage> {
        let name = validated_name(name)?;

        if name == PROTECTED_STAGE_NAME {
            return Err(PipelineError::ProtectedNameConflict);
        }

        let txn = self.connection.begin().await?;

        Pipelines::find_by_id(*pipeline_id)
            .one(&txn)
            .await?
            .ok_or_else(|| PipelineError::not_found("pipeline", pipeline_id))?;

        let duplicate = Stages::find()
            .filter(stages::Column::PipelineId.eq(*pipeline_id))
            .filter(stages::Column::Name.eq(&name))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(PipelineError::DuplicateStageName { name });
        }

        let next_order = max_order(&txn, pipeline_id).await? + 1;
        let now = chrono::Utc::now();

        let active_model = stages::ActiveModel {
            id: Set(Uuid::new_v4()),
            pipeline_id: Set(*pipeline_id),
            name: Set(name.clone()),
            stage_order: Set(next_order),
            notes: Set(None),
            completed_at: Set(None),
            is_current: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = match active_model.insert(&txn).await {
            Ok(m) => m,
            Err(e) if is_unique_violation(&e) => {
                return Err(PipelineError::DuplicateStageName { name });
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;
        debug!("Added stage '{}' at order {}", model.name, next_order);

        Ok(stage_from_model(model))
    }

    /// Rename a stage
    ///
    /// The protected stage rejects any rename, even to its own name, and no
    /// other stage may take the protected name. Only `name` changes;
    /// order, notes, and activity are untouched.
    pub async fn rename(&self, stage_id: &Uuid, new_name: &str) -> PipelineResult<Stage> {
        let new_name = validated_name(new_name)?;

        let txn = self.connection.begin().await?;

        let model = Stages::find_by_id(*stage_id)
            .one(&txn)
            .await?
            .ok_or_else(|| PipelineError::not_found("stage", stage_id))?;

        if stage_from_model(model.clone()).is_protected() {
            return Err(PipelineError::ProtectedStageRename);
        }
        if new_name == PROTECTED_STAGE_NAME {
            return Err(PipelineError::ProtectedNameConflict);
        }

        let duplicate = Stages::find()
            .filter(stages::Column::PipelineId.eq(model.pipeline_id))
            .filter(stages::Column::Name.eq(&new_name))
            .filter(stages::Column::Id.ne(model.id))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(PipelineError::DuplicateStageName { name: new_name });
        }

        let mut active_model: stages::ActiveModel = model.into();
        active_model.name = Set(new_name.clone());
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = match active_model.update(&txn).await {
            Ok(m) => m,
            Err(e) if is_unique_violation(&e) => {
                return Err(PipelineError::DuplicateStageName { name: new_name });
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;

        Ok(stage_from_model(updated))
    }

    /// Set the active flag unconditionally (idempotent)
    ///
    /// No cascade to sub-stages: stage and sub-stage activity are
    /// independent dimensions, so a temporary deactivation never loses the
    /// sub-stage toggle state.
    pub async fn set_active(&self, stage_id: &Uuid, is_active: bool) -> PipelineResult<Stage> {
        let model = Stages::find_by_id(*stage_id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| PipelineError::not_found("stage", stage_id))?;

        let mut active_model: stages::ActiveModel = model.into();
        active_model.is_active = Set(is_active);
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = active_model.update(&*self.connection).await?;
        Ok(stage_from_model(updated))
    }

    /// Apply a full renumbering of a pipeline's stages
    ///
    /// The batch must cover exactly the pipeline's stages, keyed by id,
    /// with orders forming a contiguous 1..N permutation. Partial or
    /// inconsistent submissions are rejected wholesale; nothing is applied
    /// unless everything validates.
    pub async fn reorder(
        &self,
        pipeline_id: &Uuid,
        assignments: &[StageOrderAssignment],
    ) -> PipelineResult<()> {
        let txn = self.connection.begin().await?;

        let models = Stages::find()
            .filter(stages::Column::PipelineId.eq(*pipeline_id))
            .all(&txn)
            .await?;
        if models.is_empty() {
            return Err(PipelineError::not_found("pipeline", pipeline_id));
        }

        validate_permutation(&models, assignments)?;

        let by_id: std::collections::HashMap<Uuid, stages::Model> =
            models.into_iter().map(|m| (m.id, m)).collect();
        let now = chrono::Utc::now();

        for assignment in assignments {
            // validate_permutation guarantees membership
            let model = by_id[&assignment.stage_id].clone();
            if model.stage_order == assignment.order {
                continue;
            }
            let mut active_model: stages::ActiveModel = model.into();
            active_model.stage_order = Set(assignment.order);
            active_model.updated_at = Set(now);
            active_model.update(&txn).await?;
        }

        txn.commit().await?;
        debug!(
            "Reordered {} stages in pipeline {}",
            assignments.len(),
            pipeline_id
        );

        Ok(())
    }

    /// Bulk-overwrite stage notes, keyed by id
    ///
    /// Partial batches are fine (notes are last-writer-wins), but an id
    /// that does not belong to the pipeline aborts the whole batch.
    pub async fn set_notes(
        &self,
        pipeline_id: &Uuid,
        assignments: &[StageNotesAssignment],
    ) -> PipelineResult<()> {
        let txn = self.connection.begin().await?;

        let member_ids: HashSet<Uuid> = Stages::find()
            .filter(stages::Column::PipelineId.eq(*pipeline_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
        if member_ids.is_empty() {
            return Err(PipelineError::not_found("pipeline", pipeline_id));
        }

        let now = chrono::Utc::now();
        for assignment in assignments {
            if !member_ids.contains(&assignment.stage_id) {
                return Err(PipelineError::not_found("stage", assignment.stage_id));
            }
            let model = Stages::find_by_id(assignment.stage_id)
                .one(&txn)
                .await?
                .ok_or_else(|| PipelineError::not_found("stage", assignment.stage_id))?;
            let mut active_model: stages::ActiveModel = model.into();
            active_model.notes = Set(assignment.notes.clone());
            active_model.updated_at = Set(now);
            active_model.update(&txn).await?;
        }

        txn.commit().await?;

        Ok(())
    }

    /// Stamp a stage's completion date (now if unspecified)
    pub async fn complete(
        &self,
        stage_id: &Uuid,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> PipelineResult<Stage> {
        let model = Stages::find_by_id(*stage_id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| PipelineError::not_found("stage", stage_id))?;

        let mut active_model: stages::ActiveModel = model.into();
        active_model.completed_at = Set(Some(completed_at.unwrap_or_else(chrono::Utc::now)));
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = active_model.update(&*self.connection).await?;
        Ok(stage_from_model(updated))
    }

    /// Clear a stage's completion date
    pub async fn reopen(&self, stage_id: &Uuid) -> PipelineResult<Stage> {
        let model = Stages::find_by_id(*stage_id)
            .one(&*self.connection)
            .await?
            .ok_or_else(|| PipelineError::not_found("stage", stage_id))?;

        let mut active_model: stages::ActiveModel = model.into();
        active_model.completed_at = Set(None);
        active_model.updated_at = Set(chrono::Utc::now());

        let updated = active_model.update(&*self.connection).await?;
        Ok(stage_from_model(updated))
    }

    /// Find stage by ID
    pub async fn find_by_id(&self, stage_id: &Uuid) -> PipelineResult<Option<Stage>> {
        let model = Stages::find_by_id(*stage_id).one(&*self.connection).await?;
        Ok(model.map(stage_from_model))
    }

    /// List a pipeline's stages in order
    pub async fn list_for_pipeline(&self, pipeline_id: &Uuid) -> PipelineResult<Vec<Stage>> {
        let models = Stages::find()
            .filter(stages::Column::PipelineId.eq(*pipeline_id))
            .order_by_asc(stages::Column::StageOrder)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(stage_from_model).collect())
    }
}

async fn max_order(txn: &DatabaseTransaction, pipeline_id: &Uuid) -> PipelineResult<i32> {
    let top = Stages::find()
        .filter(stages::Column::PipelineId.eq(*pipeline_id))
        .order_by_desc(stages::Column::StageOrder)
        .one(txn)
        .await?;
    Ok(top.map(|m| m.stage_order).unwrap_or(0))
}

fn validated_name(name: &str) -> PipelineResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::validation("Stage name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Check that the submitted assignments cover exactly the pipeline's stages
/// with a contiguous 1..N permutation of orders.
fn validate_permutation(
    models: &[stages::Model],
    assignments: &[StageOrderAssignment],
) -> PipelineResult<()> {
    if assignments.len() != models.len() {
        return Err(PipelineError::validation(format!(
            "Reorder must cover all {} stages, got {}",
            models.len(),
            assignments.len()
        )));
    }

    let member_ids: HashSet<Uuid> = models.iter().map(|m| m.id).collect();
    let mut seen_ids = HashSet::with_capacity(assignments.len());
    let mut seen_orders = HashSet::with_capacity(assignments.len());
    for assignment in assignments {
        if !member_ids.contains(&assignment.stage_id) {
            return Err(PipelineError::validation(format!(
                "Stage {} does not belong to this pipeline",
                assignment.stage_id
            )));
        }
        if !seen_ids.insert(assignment.stage_id) {
            return Err(PipelineError::validation(format!(
                "Stage {} appears more than once",
                assignment.stage_id
            )));
        }
        if assignment.order < 1 {
            return Err(PipelineError::validation(
                "Stage order must be a positive integer",
            ));
        }
        if assignment.order > assignments.len() as i32 {
            return Err(PipelineError::validation(format!(
                "Stage order {} exceeds stage count {}",
                assignment.order,
                assignments.len()
            )));
        }
        if !seen_orders.insert(assignment.order) {
            return Err(PipelineError::validation(format!(
                "Duplicate stage order {}",
                assignment.order
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::database::repositories::{
        PipelineSeaOrmRepository, StatusCatalogSeaOrmRepository,
    };
    use crate::models::PipelineCreateRequest;

    async fn setup_pipeline(selected: &[&str]) -> (Database, Uuid) {
        let db = Database::new_in_memory().await.expect("memory db");
        db.migrate().await.expect("migrations");
        let catalog = StatusCatalogSeaOrmRepository::new(db.connection())
            .list_ordered()
            .await
            .expect("catalog");
        let pipeline = PipelineSeaOrmRepository::new(db.connection())
            .create(
                PipelineCreateRequest {
                    country_id: Uuid::new_v4(),
                    selected_catalog_names: selected.iter().map(|n| n.to_string()).collect(),
                    notes: None,
                },
                &catalog,
            )
            .await
            .expect("create pipeline");
        (db, pipeline.id)
    }

    #[tokio::test]
    async fn test_add_stage_assigns_monotonic_order() {
        let (db, pipeline_id) = setup_pipeline(&["Document Review"]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let interview = repo.create(&pipeline_id, "Interview").await.expect("add");
        assert_eq!(interview.order, 3, "seeded 2 stages, new one lands at 3");

        let offer = repo.create(&pipeline_id, "Offer").await.expect("add");
        assert!(offer.order > interview.order);
    }

    #[tokio::test]
    async fn test_add_duplicate_stage_name_rejected() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        repo.create(&pipeline_id, "Interview").await.expect("first");
        let second = repo.create(&pipeline_id, "Interview").await;
        assert!(matches!(
            second,
            Err(PipelineError::DuplicateStageName { name }) if name == "Interview"
        ));
    }

    #[tokio::test]
    async fn test_add_protected_name_rejected() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let result = repo.create(&pipeline_id, "New").await;
        assert!(matches!(result, Err(PipelineError::ProtectedNameConflict)));
    }

    #[tokio::test]
    async fn test_add_empty_name_rejected() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let result = repo.create(&pipeline_id, "   ").await;
        assert!(matches!(result, Err(PipelineError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_rename_protected_stage_always_fails() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stages = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        let protected = &stages[0];
        assert_eq!(protected.name, "New");
        assert!(protected.is_protected());

        let renamed = repo.rename(&protected.id, "Intake").await;
        assert!(matches!(renamed, Err(PipelineError::ProtectedStageRename)));

        // Even renaming to the same value is rejected
        let same = repo.rename(&protected.id, "New").await;
        assert!(matches!(same, Err(PipelineError::ProtectedStageRename)));
    }

    #[tokio::test]
    async fn test_rename_to_protected_name_rejected() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stage = repo.create(&pipeline_id, "Interview").await.expect("add");
        let result = repo.rename(&stage.id, "New").await;
        assert!(matches!(result, Err(PipelineError::ProtectedNameConflict)));
    }

    #[tokio::test]
    async fn test_rename_to_sibling_name_rejected_self_allowed() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let a = repo.create(&pipeline_id, "Interview").await.expect("a");
        let b = repo.create(&pipeline_id, "Offer").await.expect("b");

        let clash = repo.rename(&b.id, "Interview").await;
        assert!(matches!(
            clash,
            Err(PipelineError::DuplicateStageName { .. })
        ));

        // Renaming a stage to its own current name is a no-op, not a clash
        let same = repo.rename(&a.id, "Interview").await.expect("self rename");
        assert_eq!(same.name, "Interview");
    }

    #[tokio::test]
    async fn test_rename_touches_only_the_name() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stage = repo.create(&pipeline_id, "Interview").await.expect("add");
        let toggled = repo.set_active(&stage.id, false).await.expect("toggle");
        let renamed = repo.rename(&stage.id, "Panel Interview").await.expect("rename");

        assert_eq!(renamed.order, toggled.order);
        assert!(!renamed.is_active);
        assert_eq!(renamed.notes, toggled.notes);
    }

    #[tokio::test]
    async fn test_toggle_active_is_idempotent() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stage = repo.create(&pipeline_id, "Interview").await.expect("add");
        let once = repo.set_active(&stage.id, true).await.expect("once");
        assert!(once.is_active);
        let twice = repo.set_active(&stage.id, true).await.expect("twice");
        assert!(twice.is_active);
    }

    #[tokio::test]
    async fn test_reorder_full_permutation_applies() {
        let (db, pipeline_id) =
            setup_pipeline(&["Document Review", "Visa Processing"]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stages = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        // Reverse everything after the protected stage
        let assignments = vec![
            StageOrderAssignment {
                stage_id: stages[0].id,
                order: 1,
            },
            StageOrderAssignment {
                stage_id: stages[1].id,
                order: 3,
            },
            StageOrderAssignment {
                stage_id: stages[2].id,
                order: 2,
            },
        ];
        repo.reorder(&pipeline_id, &assignments).await.expect("reorder");

        let after = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        let names: Vec<&str> = after.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Visa Processing", "Document Review"]);
        let orders: Vec<i32> = after.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reorder_partial_batch_rejected() {
        let (db, pipeline_id) = setup_pipeline(&["Document Review"]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stages = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        let partial = vec![StageOrderAssignment {
            stage_id: stages[0].id,
            order: 2,
        }];
        let result = repo.reorder(&pipeline_id, &partial).await;
        assert!(matches!(result, Err(PipelineError::Validation { .. })));

        // Nothing was applied
        let after = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        let orders: Vec<i32> = after.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_reorder_non_contiguous_orders_rejected() {
        let (db, pipeline_id) = setup_pipeline(&["Document Review"]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stages = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        let gapped = vec![
            StageOrderAssignment {
                stage_id: stages[0].id,
                order: 1,
            },
            StageOrderAssignment {
                stage_id: stages[1].id,
                order: 5,
            },
        ];
        let result = repo.reorder(&pipeline_id, &gapped).await;
        assert!(matches!(result, Err(PipelineError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_set_notes_unknown_stage_aborts_batch() {
        let (db, pipeline_id) = setup_pipeline(&["Document Review"]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stages = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        let batch = vec![
            StageNotesAssignment {
                stage_id: stages[1].id,
                notes: Some("check passports".to_string()),
            },
            StageNotesAssignment {
                stage_id: Uuid::new_v4(),
                notes: Some("orphan".to_string()),
            },
        ];
        let result = repo.set_notes(&pipeline_id, &batch).await;
        assert!(matches!(result, Err(PipelineError::NotFound { .. })));

        // All-or-nothing: the valid entry was rolled back too
        let after = repo.find_by_id(&stages[1].id).await.expect("find").unwrap();
        assert_eq!(after.notes, None);
    }

    #[tokio::test]
    async fn test_set_notes_partial_batch_applies() {
        let (db, pipeline_id) = setup_pipeline(&["Document Review"]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stages = repo.list_for_pipeline(&pipeline_id).await.expect("list");
        let batch = vec![StageNotesAssignment {
            stage_id: stages[1].id,
            notes: Some("check passports".to_string()),
        }];
        repo.set_notes(&pipeline_id, &batch).await.expect("notes");

        let after = repo.find_by_id(&stages[1].id).await.expect("find").unwrap();
        assert_eq!(after.notes.as_deref(), Some("check passports"));
        // The omitted stage is untouched
        let untouched = repo.find_by_id(&stages[0].id).await.expect("find").unwrap();
        assert_eq!(untouched.notes, None);
    }

    #[tokio::test]
    async fn test_complete_and_reopen() {
        let (db, pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let stage = repo.create(&pipeline_id, "Interview").await.expect("add");
        let done = repo.complete(&stage.id, None).await.expect("complete");
        assert!(done.completed_at.is_some());

        let reopened = repo.reopen(&stage.id).await.expect("reopen");
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_stage_is_not_found() {
        let (db, _pipeline_id) = setup_pipeline(&[]).await;
        let repo = StageSeaOrmRepository::new(db.connection());

        let result = repo.rename(&Uuid::new_v4(), "Anything").await;
        assert!(matches!(result, Err(PipelineError::NotFound { .. })));
    }
}
