//! Schema version ledger
//!
//! The ledger is the ordered record of applied steps. It is loaded from the
//! history table, passed explicitly through every apply/revert, and must
//! always be a prefix of the catalog.

use crate::contract::model::StepId;
use crate::contract::MigrationError;
use super::step::{Catalog, MigrationStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One applied step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: StepId,
    pub name: String,
    /// Checksum of the step's forward operations when it was applied
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

/// What an apply/revert request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPlan {
    /// Preconditions hold; the step may execute
    Ready,
    AlreadyApplied,
    AlreadyReverted,
}

/// Applied steps in ascending id order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(mut entries: Vec<LedgerEntry>) -> Self {
        entries.sort_by_key(|e| e.id);
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id of the most recently applied step
    pub fn current(&self) -> Option<StepId> {
        self.entries.last().map(|e| e.id)
    }

    pub fn is_applied(&self, id: StepId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Verify the ledger is a prefix of the catalog with matching checksums
    pub fn check_against(&self, catalog: &Catalog) -> Result<(), MigrationError> {
        for (position, entry) in self.entries.iter().enumerate() {
            let Some(expected) = catalog.steps().get(position) else {
                return Err(self.misplaced(catalog, entry, position));
            };
            if expected.id() != entry.id {
                return Err(self.misplaced(catalog, entry, position));
            }
            let checksum = catalog.checksum_at(position).unwrap_or_default();
            if checksum != entry.checksum {
                return Err(MigrationError::ChecksumMismatch {
                    step: entry.id,
                    recorded: entry.checksum.clone(),
                    expected: checksum.to_string(),
                });
            }
        }
        Ok(())
    }

    fn misplaced(&self, catalog: &Catalog, entry: &LedgerEntry, position: usize) -> MigrationError {
        match catalog.position(entry.id) {
            None => MigrationError::UnknownStep { step: entry.id },
            Some(_) => MigrationError::OrderingViolation {
                step: entry.id,
                detail: match catalog.steps().get(position) {
                    Some(expected) => format!(
                        "recorded at position {} where {} was expected",
                        position,
                        expected.label()
                    ),
                    None => format!("recorded at position {} beyond the catalog", position),
                },
            },
        }
    }

    /// Steps of the catalog not yet applied, in apply order
    pub fn pending<'c>(&self, catalog: &'c Catalog) -> &'c [MigrationStep] {
        catalog.steps().get(self.entries.len()..).unwrap_or_default()
    }

    /// Resolve an apply request. Only the next step in order may run.
    pub fn plan_apply(&self, catalog: &Catalog, id: StepId) -> Result<StepPlan, MigrationError> {
        let position = catalog
            .position(id)
            .ok_or(MigrationError::UnknownStep { step: id })?;
        let applied = self.entries.len();
        if position < applied {
            return Ok(StepPlan::AlreadyApplied);
        }
        if position > applied {
            let missing = &catalog.steps()[applied];
            return Err(MigrationError::OrderingViolation {
                step: id,
                detail: format!("predecessor {} is not applied", missing.label()),
            });
        }
        Ok(StepPlan::Ready)
    }

    /// Resolve a revert request. Only the most recent step may be reverted.
    pub fn plan_revert(&self, catalog: &Catalog, id: StepId) -> Result<StepPlan, MigrationError> {
        let position = catalog
            .position(id)
            .ok_or(MigrationError::UnknownStep { step: id })?;
        let applied = self.entries.len();
        if position >= applied {
            return Ok(StepPlan::AlreadyReverted);
        }
        if position + 1 < applied {
            let latest = &self.entries[applied - 1];
            return Err(MigrationError::OrderingViolation {
                step: id,
                detail: format!("successor {}_{} is still applied", latest.id, latest.name),
            });
        }
        Ok(StepPlan::Ready)
    }

    pub fn record_applied(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn record_reverted(&mut self, id: StepId) -> Option<LedgerEntry> {
        let position = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(position))
    }
}
