//! In-memory schema repository
//!
//! Executes steps against a model schema instead of a database. Used for
//! dry runs and tests; failures can be injected to exercise rollback.

use crate::contract::model::{Schema, StepId};
use crate::contract::{Location, MigrationError};
use crate::domain::ledger::{Ledger, LedgerEntry};
use crate::domain::ops::apply_all;
use crate::domain::repository::SchemaRepository;
use crate::domain::step::{Direction, MigrationStep};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct State {
    ledger: Ledger,
    schema: Schema,
    fail_on: Option<(StepId, Direction)>,
}

#[derive(Debug, Default)]
pub struct InMemorySchemaRepository {
    state: Mutex<State>,
}

impl InMemorySchemaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing ledger and the schema it produced
    pub fn with_state(ledger: Ledger, schema: Schema) -> Self {
        Self {
            state: Mutex::new(State {
                ledger,
                schema,
                fail_on: None,
            }),
        }
    }

    pub fn schema(&self) -> Schema {
        self.state.lock().schema.clone()
    }

    pub fn ledger(&self) -> Ledger {
        self.state.lock().ledger.clone()
    }

    /// Make the next execution of `step` in `direction` fail after its
    /// operations have run, as a database error would
    pub fn fail_on(&self, step: StepId, direction: Direction) {
        self.state.lock().fail_on = Some((step, direction));
    }
}

#[async_trait]
impl SchemaRepository for InMemorySchemaRepository {
    async fn load_ledger(&self) -> Result<Ledger, MigrationError> {
        Ok(self.state.lock().ledger.clone())
    }

    async fn execute(
        &self,
        step: &MigrationStep,
        direction: Direction,
        entry: &LedgerEntry,
    ) -> Result<(), MigrationError> {
        let mut state = self.state.lock();
        let ops = step.ops(direction);

        let mut working = state.schema.clone();
        apply_all(&mut working, &ops)?;

        if state.fail_on == Some((step.id(), direction)) {
            state.fail_on = None;
            let last = ops.last();
            return Err(MigrationError::Database {
                step: step.label(),
                operation: last.map(|op| op.describe()).unwrap_or_default(),
                location: last
                    .map(|op| op.location())
                    .unwrap_or_else(|| Location::table("")),
                source: sea_orm::DbErr::Custom("injected failure".to_string()),
            });
        }

        state.schema = working;
        match direction {
            Direction::Up => state.ledger.record_applied(entry.clone()),
            Direction::Down => {
                state.ledger.record_reverted(entry.id);
            }
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
