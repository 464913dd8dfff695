//! Native client trait for in-process callers
//!
//! Deployment tooling and tests drive migrations through this trait; the
//! `site-schema` binary is one such caller.

use super::{
    error::MigrationError,
    model::{MigrationStatus, RunReport, StepId},
};
use async_trait::async_trait;

/// Migration API
#[async_trait]
pub trait MigrationApi: Send + Sync {
    /// Current version plus applied and pending steps
    async fn status(&self) -> Result<MigrationStatus, MigrationError>;

    /// Apply all pending steps
    async fn up(&self) -> Result<RunReport, MigrationError>;

    /// Revert the `count` most recent steps
    async fn down(&self, count: usize) -> Result<RunReport, MigrationError>;

    /// Apply one step; its predecessors must already be applied
    async fn apply(&self, step: StepId) -> Result<RunReport, MigrationError>;

    /// Revert one step; it must be the most recently applied
    async fn revert(&self, step: StepId) -> Result<RunReport, MigrationError>;
}
