//! End-to-end pipeline flow through the service layer
//!
//! Exercises the full inbound surface the way the presentation layer
//! would: create a pipeline for a country, grow and reshape its stages,
//! nest sub-stages, and read back the ordered projection.

use uuid::Uuid;

use country_pipeline::{
    database::Database,
    errors::PipelineError,
    models::{PipelineCreateRequest, StageNotesAssignment, StageOrderAssignment},
    services::{CatalogService, PipelineQueryService, StageManagerService, SubStageManagerService},
};

async fn setup() -> Database {
    let db = Database::new_in_memory().await.expect("memory db");
    db.migrate().await.expect("migrations");
    db
}

#[tokio::test]
async fn test_full_pipeline_lifecycle() {
    let db = setup().await;
    let stages_svc = StageManagerService::new(&db);
    let subs_svc = SubStageManagerService::new(&db);
    let query_svc = PipelineQueryService::new(&db);

    let country_id = Uuid::new_v4();
    let pipeline = stages_svc
        .create_pipeline(PipelineCreateRequest {
            country_id,
            selected_catalog_names: vec![
                "New".to_string(),
                "Document Review".to_string(),
                "Visa Processing".to_string(),
            ],
            notes: Some("Primary market".to_string()),
        })
        .await
        .expect("create pipeline");

    // Seed invariant: protected stage first, selection in order after it
    let view = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    let seeded: Vec<(&str, i32)> = view
        .stages
        .iter()
        .map(|s| (s.stage.name.as_str(), s.stage.order))
        .collect();
    assert_eq!(
        seeded,
        vec![("New", 1), ("Document Review", 2), ("Visa Processing", 3)]
    );

    // Grow the pipeline and reshape it
    let interview = stages_svc
        .add_stage(&pipeline.id, "Interview")
        .await
        .expect("add stage");
    assert_eq!(interview.order, 4);

    let current = query_svc
        .get_pipeline_by_country(&country_id)
        .await
        .expect("by country");
    let mut assignments: Vec<StageOrderAssignment> = current
        .stages
        .iter()
        .map(|s| StageOrderAssignment {
            stage_id: s.stage.id,
            order: s.stage.order,
        })
        .collect();
    // Swap Interview ahead of Visa Processing
    assignments[2].order = 4;
    assignments[3].order = 3;
    stages_svc
        .reorder_stages(&pipeline.id, &assignments)
        .await
        .expect("reorder");

    let after = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    let names: Vec<&str> = after.stages.iter().map(|s| s.stage.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["New", "Document Review", "Interview", "Visa Processing"]
    );

    // Nest sub-stages under Document Review
    let doc_review = &after.stages[1].stage;
    subs_svc
        .add_sub_stage(&doc_review.id, "Collect transcripts", None)
        .await
        .expect("sub one");
    subs_svc
        .add_sub_stage(
            &doc_review.id,
            "Verify transcripts",
            Some("Originals only".to_string()),
        )
        .await
        .expect("sub two");

    let nested = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    let subs: Vec<&str> = nested.stages[1]
        .sub_stages
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(subs, vec!["Collect transcripts", "Verify transcripts"]);

    // Notes batch, keyed by id
    stages_svc
        .set_stage_notes(
            &pipeline.id,
            &[StageNotesAssignment {
                stage_id: doc_review.id,
                notes: Some("Passport copies required".to_string()),
            }],
        )
        .await
        .expect("notes");
    let noted = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    assert_eq!(
        noted.stages[1].stage.notes.as_deref(),
        Some("Passport copies required")
    );
}

#[tokio::test]
async fn test_is_current_follows_completion() {
    let db = setup().await;
    let stages_svc = StageManagerService::new(&db);
    let query_svc = PipelineQueryService::new(&db);

    let pipeline = stages_svc
        .create_pipeline(PipelineCreateRequest {
            country_id: Uuid::new_v4(),
            selected_catalog_names: vec!["Document Review".to_string()],
            notes: None,
        })
        .await
        .expect("create pipeline");

    // Before any completion, the protected first stage is current
    let view = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    assert!(view.stages[0].is_current);
    assert!(!view.stages[1].is_current);

    // Completing the first stage moves the current marker forward
    let first_id = view.stages[0].stage.id;
    stages_svc
        .complete_stage(&first_id, None)
        .await
        .expect("complete");

    let view = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    assert!(!view.stages[0].is_current);
    assert!(view.stages[1].is_current);

    // Reopening restores it
    stages_svc.reopen_stage(&first_id).await.expect("reopen");
    let view = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    assert!(view.stages[0].is_current);
}

#[tokio::test]
async fn test_protected_stage_survives_service_surface() {
    let db = setup().await;
    let stages_svc = StageManagerService::new(&db);
    let query_svc = PipelineQueryService::new(&db);

    let pipeline = stages_svc
        .create_pipeline(PipelineCreateRequest {
            country_id: Uuid::new_v4(),
            selected_catalog_names: vec![],
            notes: None,
        })
        .await
        .expect("create pipeline");

    let view = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    let protected_id = view.stages[0].stage.id;

    let rename = stages_svc.rename_stage(&protected_id, "Intake").await;
    assert!(matches!(rename, Err(PipelineError::ProtectedStageRename)));

    let add = stages_svc.add_stage(&pipeline.id, "New").await;
    assert!(matches!(add, Err(PipelineError::ProtectedNameConflict)));

    // The protected stage can still be toggled like any other
    let toggled = stages_svc
        .toggle_stage_active(&protected_id, false)
        .await
        .expect("toggle");
    assert!(!toggled.is_active);
}

#[tokio::test]
async fn test_catalog_lists_in_browsing_order() {
    let db = setup().await;
    let catalog = CatalogService::new(&db).list_ordered().await.expect("list");

    assert!(!catalog.is_empty());
    assert_eq!(catalog[0].name, "New");
    let orders: Vec<i32> = catalog.iter().map(|c| c.order).collect();
    let mut sorted = orders.clone();
    sorted.sort_unstable();
    assert_eq!(orders, sorted);
}

#[tokio::test]
async fn test_soft_deactivated_pipeline_still_projects() {
    let db = setup().await;
    let stages_svc = StageManagerService::new(&db);
    let query_svc = PipelineQueryService::new(&db);

    let pipeline = stages_svc
        .create_pipeline(PipelineCreateRequest {
            country_id: Uuid::new_v4(),
            selected_catalog_names: vec![],
            notes: None,
        })
        .await
        .expect("create pipeline");

    stages_svc
        .set_pipeline_active(&pipeline.id, false)
        .await
        .expect("deactivate");

    // Soft-deleted, never hard-deleted: the record and its stages remain
    let view = query_svc.get_pipeline(&pipeline.id).await.expect("view");
    assert!(!view.pipeline.is_active);
    assert_eq!(view.stages.len(), 1);

    let listed = query_svc.list_pipelines().await.expect("list");
    assert_eq!(listed.len(), 1);
}
