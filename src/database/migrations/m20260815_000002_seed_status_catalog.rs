//! Migration to seed the global status catalog
//!
//! The catalog is the read-only list of reusable stage-name templates
//! offered when a new pipeline is created. Entries are copied by value into
//! stages at creation time; editing the catalog later never touches
//! already-created stages.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

impl Migration {
    /// Create UUID value for database insertion
    ///
    /// Bound as a typed `Uuid` so every backend stores the id in the same
    /// representation the entity layer reads back; inserting hyphenated
    /// text would not round-trip through sqlx on SQLite.
    fn create_uuid_value(uuid_str: &str) -> Result<SimpleExpr, DbErr> {
        let id = uuid::Uuid::parse_str(uuid_str)
            .map_err(|e| DbErr::Custom(format!("Invalid catalog seed id '{uuid_str}': {e}")))?;
        Ok(Expr::value(id))
    }

    /// Create timestamp value for database insertion with proper type casting
    fn create_timestamp_value(
        manager: &SchemaManager<'_>,
        timestamp: &chrono::DateTime<chrono::Utc>,
    ) -> SimpleExpr {
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => {
                Expr::cust(&format!("'{}'::timestamptz", timestamp.to_rfc3339()))
            }
            sea_orm::DatabaseBackend::MySql => {
                Expr::value(timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
            }
            _ => Expr::value(timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now();

        // Stock agency statuses. "New" must be entry 1: it doubles as the
        // protected stage name seeded into every pipeline.
        let default_statuses = vec![
            (
                "0d2c9f1a-4b3e-4f60-9a11-1a2b3c4d5e01",
                "New",
                "#3498db",
                1,
            ),
            (
                "0d2c9f1a-4b3e-4f60-9a11-1a2b3c4d5e02",
                "Document Review",
                "#f39c12",
                2,
            ),
            (
                "0d2c9f1a-4b3e-4f60-9a11-1a2b3c4d5e03",
                "Application Submitted",
                "#9b59b6",
                3,
            ),
            (
                "0d2c9f1a-4b3e-4f60-9a11-1a2b3c4d5e04",
                "Offer Received",
                "#2ecc71",
                4,
            ),
            (
                "0d2c9f1a-4b3e-4f60-9a11-1a2b3c4d5e05",
                "Visa Processing",
                "#e67e22",
                5,
            ),
            (
                "0d2c9f1a-4b3e-4f60-9a11-1a2b3c4d5e06",
                "Enrolled",
                "#27ae60",
                6,
            ),
            (
                "0d2c9f1a-4b3e-4f60-9a11-1a2b3c4d5e07",
                "Rejected",
                "#e74c3c",
                7,
            ),
        ];

        for (id, name, color, order) in default_statuses {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(StatusCatalog::Table)
                        .columns([
                            StatusCatalog::Id,
                            StatusCatalog::Name,
                            StatusCatalog::Color,
                            StatusCatalog::CatalogOrder,
                            StatusCatalog::CreatedAt,
                            StatusCatalog::UpdatedAt,
                        ])
                        .values_panic([
                            Self::create_uuid_value(id)?,
                            name.into(),
                            color.into(),
                            order.into(),
                            Self::create_timestamp_value(manager, &now),
                            Self::create_timestamp_value(manager, &now),
                        ])
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(StatusCatalog::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum StatusCatalog {
    Table,
    Id,
    Name,
    Color,
    CatalogOrder,
    CreatedAt,
    UpdatedAt,
}
