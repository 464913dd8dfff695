//! Migration steps and the ordered catalog

use crate::contract::model::{Schema, StepId};
use crate::contract::MigrationError;
use super::diff::diff;
use super::ops::{apply_all, SchemaOp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Direction a step is executed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// One versioned, reversible schema change.
///
/// Only the forward operations are authored; the backward list is derived
/// by inverting them in reverse order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    id: StepId,
    name: String,
    ops: Vec<SchemaOp>,
}

impl MigrationStep {
    pub fn new(id: u64, name: impl Into<String>, ops: Vec<SchemaOp>) -> Self {
        Self {
            id: StepId(id),
            name: name.into(),
            ops,
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `{id}_{name}`, the form used in logs and by the sea-orm-migration runner
    pub fn label(&self) -> String {
        format!("{}_{}", self.id, self.name)
    }

    pub fn forward(&self) -> &[SchemaOp] {
        &self.ops
    }

    pub fn backward(&self) -> Vec<SchemaOp> {
        self.ops.iter().rev().map(SchemaOp::inverse).collect()
    }

    pub fn ops(&self, direction: Direction) -> Vec<SchemaOp> {
        match direction {
            Direction::Up => self.ops.clone(),
            Direction::Down => self.backward(),
        }
    }

    /// SHA-256 over the canonical JSON of the forward operations
    pub fn checksum(&self) -> Result<String, MigrationError> {
        let bytes = serde_json::to_vec(&self.ops).map_err(|e| {
            MigrationError::InvalidCatalog(format!("cannot serialize {}: {}", self.label(), e))
        })?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Ordered, validated list of migration steps
#[derive(Debug, Clone)]
pub struct Catalog {
    steps: Vec<MigrationStep>,
    checksums: Vec<String>,
}

impl Catalog {
    pub fn new(steps: Vec<MigrationStep>) -> Result<Self, MigrationError> {
        super::validation::validate_steps(&steps)?;
        let checksums = steps
            .iter()
            .map(MigrationStep::checksum)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps, checksums })
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn get(&self, id: StepId) -> Result<&MigrationStep, MigrationError> {
        self.position(id)
            .map(|pos| &self.steps[pos])
            .ok_or(MigrationError::UnknownStep { step: id })
    }

    pub fn checksum_at(&self, position: usize) -> Option<&str> {
        self.checksums.get(position).map(String::as_str)
    }

    /// Model schema after the first `applied` steps
    pub fn schema_at(&self, applied: usize) -> Result<Schema, MigrationError> {
        let mut schema = Schema::empty();
        for step in self.steps.iter().take(applied) {
            apply_all(&mut schema, step.forward())?;
        }
        Ok(schema)
    }

    pub fn final_schema(&self) -> Result<Schema, MigrationError> {
        self.schema_at(self.steps.len())
    }

    /// Single step that builds the final schema from nothing.
    ///
    /// Carries the id of the newest step so a fresh database bootstrapped
    /// from it reports the same current version.
    pub fn baseline_step(&self) -> Result<MigrationStep, MigrationError> {
        let last = self
            .steps
            .last()
            .ok_or_else(|| MigrationError::InvalidCatalog("catalog is empty".into()))?;
        let ops = diff(&Schema::empty(), &self.final_schema()?);
        Ok(MigrationStep::new(last.id.0, "Baseline", ops))
    }
}
