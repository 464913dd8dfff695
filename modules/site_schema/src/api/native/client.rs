//! Native client implementation - wraps the domain service for in-process calls

use crate::contract::{MigrationApi, MigrationError, MigrationStatus, RunReport, StepId};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;

/// Client that calls the domain service directly
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MigrationApi for NativeClient {
    async fn status(&self) -> Result<MigrationStatus, MigrationError> {
        self.service.status().await
    }

    async fn up(&self) -> Result<RunReport, MigrationError> {
        self.service.up().await
    }

    async fn down(&self, count: usize) -> Result<RunReport, MigrationError> {
        self.service.down(count).await
    }

    async fn apply(&self, step: StepId) -> Result<RunReport, MigrationError> {
        self.service.apply(step).await
    }

    async fn revert(&self, step: StepId) -> Result<RunReport, MigrationError> {
        self.service.revert(step).await
    }
}
