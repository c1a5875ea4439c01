//! SeaORM migrations for multi-database support
//!
//! Database-agnostic migrations that work across SQLite, PostgreSQL, and
//! MySQL. The unique indexes created here are load-bearing: they are the
//! store-level safety net behind the engine's name-uniqueness invariants.

use sea_orm_migration::prelude::*;

pub mod m20260815_000001_initial_schema;
pub mod m20260815_000002_seed_status_catalog;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260815_000001_initial_schema::Migration),
            Box::new(m20260815_000002_seed_status_catalog::Migration),
        ]
    }
}
