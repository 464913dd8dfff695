//! Entity to model mappers
//!
//! Conversions between the history entity and ledger entries

use crate::contract::model::StepId;
use crate::domain::ledger::LedgerEntry;
use super::entity::history;

impl From<history::Model> for LedgerEntry {
    fn from(entity: history::Model) -> Self {
        Self {
            id: StepId(entity.id as u64),
            name: entity.name,
            checksum: entity.checksum,
            applied_at: entity.applied_at,
        }
    }
}

impl From<&LedgerEntry> for history::ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            id: Set(entry.id.0 as i64),
            name: Set(entry.name.clone()),
            checksum: Set(entry.checksum.clone()),
            applied_at: Set(entry.applied_at),
        }
    }
}
