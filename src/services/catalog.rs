//! Status catalog service
//!
//! Read-only listing of the reusable stage-name templates offered at
//! pipeline creation.

use crate::database::Database;
use crate::database::repositories::StatusCatalogSeaOrmRepository;
use crate::errors::PipelineResult;
use crate::models::StatusCatalogEntry;

/// Read-only service over the global status catalog
pub struct CatalogService {
    catalog_repo: StatusCatalogSeaOrmRepository,
}

impl CatalogService {
    /// Create a new catalog service
    pub fn new(database: &Database) -> Self {
        Self {
            catalog_repo: StatusCatalogSeaOrmRepository::new(database.connection()),
        }
    }

    /// List catalog entries in browsing order
    pub async fn list_ordered(&self) -> PipelineResult<Vec<StatusCatalogEntry>> {
        self.catalog_repo.list_ordered().await
    }
}
