//! Pipeline query/projection service
//!
//! Pure reads, decoupled from the mutation surface. The projection always
//! reflects the latest committed state; there is no caching layer.

use uuid::Uuid;

use crate::database::Database;
use crate::database::repositories::PipelineSeaOrmRepository;
use crate::errors::PipelineResult;
use crate::models::{Pipeline, PipelineView};

/// Read-side service assembling display projections
pub struct PipelineQueryService {
    pipeline_repo: PipelineSeaOrmRepository,
}

impl PipelineQueryService {
    /// Create a new pipeline query service
    pub fn new(database: &Database) -> Self {
        Self {
            pipeline_repo: PipelineSeaOrmRepository::new(database.connection()),
        }
    }

    /// Get a pipeline with its stages and sub-stages, ordered for display
    pub async fn get_pipeline(&self, pipeline_id: &Uuid) -> PipelineResult<PipelineView> {
        self.pipeline_repo.get_view(pipeline_id).await
    }

    /// Get a pipeline resolved by the country it represents
    pub async fn get_pipeline_by_country(
        &self,
        country_id: &Uuid,
    ) -> PipelineResult<PipelineView> {
        self.pipeline_repo.get_view_by_country(country_id).await
    }

    /// List all pipelines in creation order
    pub async fn list_pipelines(&self) -> PipelineResult<Vec<Pipeline>> {
        self.pipeline_repo.list_all().await
    }
}
