//! sea-orm-migration adapter
//!
//! Exposes the catalog to the stock sea-orm-migration runner. The runner
//! keeps its own `seaql_migrations` table; use either it or the
//! `schema_history` ledger for a given database, not both.

use crate::domain::step::{Direction, MigrationStep};
use crate::infra::storage::ddl;
use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        crate::migrations::steps()
            .into_iter()
            .map(|step| Box::new(StepMigration::new(step)) as Box<dyn MigrationTrait>)
            .collect()
    }
}

/// One catalog step as a sea-orm-migration migration
pub struct StepMigration {
    label: String,
    step: MigrationStep,
}

impl StepMigration {
    pub fn new(step: MigrationStep) -> Self {
        Self {
            label: step.label(),
            step,
        }
    }

    async fn run(&self, manager: &SchemaManager<'_>, direction: Direction) -> Result<(), DbErr> {
        let plan = ddl::render_step(&self.step, direction, manager.get_database_backend())
            .map_err(|e| DbErr::Migration(e.to_string()))?;
        for (_, statements) in plan {
            for sql in statements {
                manager.get_connection().execute_unprepared(&sql).await?;
            }
        }
        Ok(())
    }
}

impl MigrationName for StepMigration {
    fn name(&self) -> &str {
        &self.label
    }
}

#[async_trait::async_trait]
impl MigrationTrait for StepMigration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.run(manager, Direction::Up).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.run(manager, Direction::Down).await
    }
}
