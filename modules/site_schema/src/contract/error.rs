//! Migration error types
//!
//! Every failure names the operation and the table (and column, when there
//! is one) it happened on. Nothing is retried.

use super::model::StepId;
use std::fmt;

/// Table, and optionally column, an error refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub table: String,
    pub column: Option<String>,
}

impl Location {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: None,
        }
    }

    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: Some(column.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "\"{}\".\"{}\"", self.table, column),
            None => write!(f, "\"{}\"", self.table),
        }
    }
}

/// Migration engine errors
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The step expects a prior table/column state that is not present
    #[error("structural conflict: {operation} on {location}: {detail}")]
    StructuralConflict {
        operation: String,
        location: Location,
        detail: String,
    },

    /// Existing rows cannot satisfy the new shape and no data rule was given
    #[error("data incompatibility: {operation} on {location}: {detail}")]
    DataIncompatibility {
        operation: String,
        location: Location,
        detail: String,
    },

    /// Apply/revert attempted out of order; rejected before any DDL
    #[error("ordering violation for step {step}: {detail}")]
    OrderingViolation { step: StepId, detail: String },

    /// Step id not present in the catalog
    #[error("unknown migration step: {step}")]
    UnknownStep { step: StepId },

    /// Applied step differs from the catalog definition
    #[error("checksum mismatch for step {step}: recorded {recorded}, catalog {expected}")]
    ChecksumMismatch {
        step: StepId,
        recorded: String,
        expected: String,
    },

    /// Backend cannot express the operation
    #[error("{backend} does not support {operation}")]
    Unsupported { backend: String, operation: String },

    /// Catalog definition is malformed
    #[error("invalid migration catalog: {0}")]
    InvalidCatalog(String),

    /// Model-level verification failed
    #[error("verification failed for {subject}: {}", .findings.join("; "))]
    Verification {
        subject: String,
        findings: Vec<String>,
    },

    /// DDL failed on the live database; the step's transaction was rolled back
    #[error("database error in step {step} during {operation} on {location}: {source}")]
    Database {
        step: String,
        operation: String,
        location: Location,
        #[source]
        source: sea_orm::DbErr,
    },

    /// Reading or writing the migration history failed
    #[error("migration history error during {operation}: {source}")]
    History {
        operation: &'static str,
        #[source]
        source: sea_orm::DbErr,
    },
}

impl MigrationError {
    pub(crate) fn conflict(
        operation: impl Into<String>,
        location: Location,
        detail: impl Into<String>,
    ) -> Self {
        Self::StructuralConflict {
            operation: operation.into(),
            location,
            detail: detail.into(),
        }
    }

    pub(crate) fn incompatible(
        operation: impl Into<String>,
        location: Location,
        detail: impl Into<String>,
    ) -> Self {
        Self::DataIncompatibility {
            operation: operation.into(),
            location,
            detail: detail.into(),
        }
    }

    pub(crate) fn history(operation: &'static str) -> impl FnOnce(sea_orm::DbErr) -> Self {
        move |source| Self::History { operation, source }
    }

    /// Ordering violations are detected before any DDL runs
    pub fn is_rejected_before_ddl(&self) -> bool {
        matches!(
            self,
            Self::OrderingViolation { .. }
                | Self::UnknownStep { .. }
                | Self::ChecksumMismatch { .. }
                | Self::Unsupported { .. }
                | Self::StructuralConflict { .. }
                | Self::DataIncompatibility { .. }
        )
    }
}
