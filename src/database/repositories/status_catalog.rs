//! SeaORM status catalog repository implementation
//!
//! The catalog is read-only for the engine: it is consulted once per
//! pipeline creation to resolve the operator-selected template names.

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::sync::Arc;

use crate::entities::{prelude::*, status_catalog};
use crate::errors::PipelineResult;
use crate::models::StatusCatalogEntry;

/// SeaORM-based status catalog repository
#[derive(Clone)]
pub struct StatusCatalogSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl StatusCatalogSeaOrmRepository {
    /// Create a new StatusCatalogSeaOrmRepository
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// List all catalog entries in browsing order
    pub async fn list_ordered(&self) -> PipelineResult<Vec<StatusCatalogEntry>> {
        let models = StatusCatalog::find()
            .order_by_asc(status_catalog::Column::CatalogOrder)
            .all(&*self.connection)
            .await?;

        Ok(models.into_iter().map(entry_from_model).collect())
    }
}

fn entry_from_model(m: status_catalog::Model) -> StatusCatalogEntry {
    StatusCatalogEntry {
        id: m.id,
        name: m.name,
        color: m.color,
        order: m.catalog_order,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::PROTECTED_STAGE_NAME;
    use std::collections::HashSet;

    async fn setup() -> Database {
        let db = Database::new_in_memory().await.expect("memory db");
        db.migrate().await.expect("migrations");
        db
    }

    #[tokio::test]
    async fn test_seeded_catalog_decodes_with_distinct_ids() {
        let db = setup().await;
        let repo = StatusCatalogSeaOrmRepository::new(db.connection());

        // Reading back the seeded rows exercises the id decode path; a
        // seed stored in the wrong representation fails here.
        let entries = repo.list_ordered().await.expect("list catalog");

        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0].name, PROTECTED_STAGE_NAME);
        assert_eq!(entries[0].order, 1);

        let ids: HashSet<_> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), entries.len());
    }

    #[tokio::test]
    async fn test_catalog_order_matches_seed_order() {
        let db = setup().await;
        let repo = StatusCatalogSeaOrmRepository::new(db.connection());

        let entries = repo.list_ordered().await.expect("list catalog");
        let orders: Vec<i32> = entries.iter().map(|e| e.order).collect();

        assert_eq!(orders, (1..=7).collect::<Vec<_>>());
    }
}
