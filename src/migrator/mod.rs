//! Embedded schema migrations, applied by `db::run_migrations` and the `migration` binary.

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_roles_and_users;
mod m20260101_000002_create_catalog_tables;
mod m20260101_000003_create_workshop_tables;
mod m20260101_000004_create_stock_tables;
mod m20260101_000005_add_lookup_indexes;
mod m20260101_000006_create_tools;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_roles_and_users::Migration),
            Box::new(m20260101_000002_create_catalog_tables::Migration),
            Box::new(m20260101_000003_create_workshop_tables::Migration),
            Box::new(m20260101_000004_create_stock_tables::Migration),
            Box::new(m20260101_000005_add_lookup_indexes::Migration),
            Box::new(m20260101_000006_create_tools::Migration),
        ]
    }
}
