//! Repository trait for schema execution
//!
//! Implementations are in infra/storage/repositories.rs (live database)
//! and infra/storage/memory.rs (model schema only).

use crate::contract::MigrationError;
use super::ledger::{Ledger, LedgerEntry};
use super::step::{Direction, MigrationStep};
use async_trait::async_trait;

/// Executes migration steps and persists the ledger
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Read the applied steps from the history table
    async fn load_ledger(&self) -> Result<Ledger, MigrationError>;

    /// Run one step atomically.
    ///
    /// `Direction::Up` executes the forward operations and inserts `entry`;
    /// `Direction::Down` executes the backward operations and removes it.
    /// Both happen in a single transaction: on failure nothing is kept.
    async fn execute(
        &self,
        step: &MigrationStep,
        direction: Direction,
        entry: &LedgerEntry,
    ) -> Result<(), MigrationError>;

    /// Backend name used in reports
    fn backend(&self) -> &'static str;
}
