use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tables in order of dependencies
        self.create_status_catalog_table(manager).await?;
        self.create_pipelines_table(manager).await?;
        self.create_stages_table(manager).await?;
        self.create_sub_stages_table(manager).await?;

        // Create indexes
        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(SubStages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pipelines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StatusCatalog::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    // Helper functions for database-specific types
    fn create_id_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_uuid_fk_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_timestamp_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_nullable_timestamp_column(
        &self,
        manager: &SchemaManager,
        column: impl IntoIden,
    ) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone(),
            _ => col.string(),
        };
        col
    }

    // Table creation methods
    async fn create_status_catalog_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StatusCatalog::Table)
                    .if_not_exists()
                    .col(
                        self.create_id_column(manager, StatusCatalog::Id)
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StatusCatalog::Name).string().not_null())
                    .col(ColumnDef::new(StatusCatalog::Color).string().not_null())
                    .col(
                        ColumnDef::new(StatusCatalog::CatalogOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(self.create_timestamp_column(manager, StatusCatalog::CreatedAt))
                    .col(self.create_timestamp_column(manager, StatusCatalog::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_pipelines_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pipelines::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Pipelines::Id).primary_key())
                    .col(self.create_uuid_fk_column(manager, Pipelines::CountryId))
                    .col(ColumnDef::new(Pipelines::Notes).text())
                    .col(
                        ColumnDef::new(Pipelines::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(self.create_timestamp_column(manager, Pipelines::CreatedAt))
                    .col(self.create_timestamp_column(manager, Pipelines::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_stages_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stages::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Stages::Id).primary_key())
                    .col(self.create_uuid_fk_column(manager, Stages::PipelineId))
                    .col(ColumnDef::new(Stages::Name).string().not_null())
                    .col(ColumnDef::new(Stages::StageOrder).integer().not_null())
                    .col(ColumnDef::new(Stages::Notes).text())
                    .col(self.create_nullable_timestamp_column(manager, Stages::CompletedAt))
                    .col(
                        ColumnDef::new(Stages::IsCurrent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Stages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(self.create_timestamp_column(manager, Stages::CreatedAt))
                    .col(self.create_timestamp_column(manager, Stages::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stages_pipeline_id")
                            .from(Stages::Table, Stages::PipelineId)
                            .to(Pipelines::Table, Pipelines::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_sub_stages_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubStages::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, SubStages::Id).primary_key())
                    .col(self.create_uuid_fk_column(manager, SubStages::StageId))
                    .col(ColumnDef::new(SubStages::Name).string().not_null())
                    .col(ColumnDef::new(SubStages::Description).text())
                    .col(ColumnDef::new(SubStages::StageOrder).integer().not_null())
                    .col(
                        ColumnDef::new(SubStages::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(self.create_nullable_timestamp_column(manager, SubStages::CompletedAt))
                    .col(
                        ColumnDef::new(SubStages::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(self.create_timestamp_column(manager, SubStages::CreatedAt))
                    .col(self.create_timestamp_column(manager, SubStages::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sub_stages_stage_id")
                            .from(SubStages::Table, SubStages::StageId)
                            .to(Stages::Table, Stages::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        // Uniqueness invariants: one pipeline per country, stage names
        // unique per pipeline, sub-stage names unique per stage, catalog
        // names globally unique.
        manager
            .create_index(
                Index::create()
                    .name("idx_pipelines_country_id")
                    .table(Pipelines::Table)
                    .col(Pipelines::CountryId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_stages_pipeline_id_name")
                    .table(Stages::Table)
                    .col(Stages::PipelineId)
                    .col(Stages::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sub_stages_stage_id_name")
                    .table(SubStages::Table)
                    .col(SubStages::StageId)
                    .col(SubStages::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_status_catalog_name")
                    .table(StatusCatalog::Table)
                    .col(StatusCatalog::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Ordered retrieval paths
        manager
            .create_index(
                Index::create()
                    .name("idx_stages_pipeline_id_stage_order")
                    .table(Stages::Table)
                    .col(Stages::PipelineId)
                    .col(Stages::StageOrder)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sub_stages_stage_id_stage_order")
                    .table(SubStages::Table)
                    .col(SubStages::StageId)
                    .col(SubStages::StageOrder)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_status_catalog_catalog_order")
                    .table(StatusCatalog::Table)
                    .col(StatusCatalog::CatalogOrder)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Pipelines {
    Table,
    Id,
    CountryId,
    Notes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Stages {
    Table,
    Id,
    PipelineId,
    Name,
    StageOrder,
    Notes,
    CompletedAt,
    IsCurrent,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SubStages {
    Table,
    Id,
    StageId,
    Name,
    Description,
    StageOrder,
    IsCompleted,
    CompletedAt,
    IsActive,
    CreatedAt,
    UpdatedAt,
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
