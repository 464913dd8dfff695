//! Domain events for the migration ledger
//!
//! Published after a step commits or fails:
//! - `step_applied` / `step_reverted`: the step's transaction committed
//! - `step_failed`: the transaction rolled back; the ledger did not move

use crate::contract::model::StepId;
use super::step::{Direction, MigrationStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ledger event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MigrationEvent {
    /// Step applied and recorded
    StepApplied(StepCompletedEvent),
    /// Step reverted and removed from the ledger
    StepReverted(StepCompletedEvent),
    /// Step failed and was rolled back
    StepFailed(StepFailedEvent),
}

/// Event data for a committed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCompletedEvent {
    /// Step identifier
    pub step: StepId,
    /// Step name
    pub name: String,
    /// Number of schema operations executed
    pub operations: usize,
    /// Wall time of the transaction
    pub duration_ms: u64,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
}

/// Event data for a failed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailedEvent {
    /// Step identifier
    pub step: StepId,
    /// Step name
    pub name: String,
    /// Direction that failed
    pub direction: Direction,
    /// Error as reported to the operator
    pub error: String,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
}

/// Event publisher trait for ledger events
///
/// Implementations should handle:
/// - Forwarding to deployment tooling (chat ops, audit log)
/// - Their own delivery failures; the migration outcome is already final
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a ledger event
    async fn publish(&self, event: MigrationEvent) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: MigrationEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Publisher that writes events to the tracing log
pub struct TracingEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: MigrationEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&event)?;
        match &event {
            MigrationEvent::StepFailed(e) => {
                tracing::error!(step = %e.step, direction = %e.direction, event = %payload, "Migration event")
            }
            MigrationEvent::StepApplied(e) | MigrationEvent::StepReverted(e) => {
                tracing::info!(step = %e.step, event = %payload, "Migration event")
            }
        }
        Ok(())
    }
}

impl MigrationEvent {
    /// Create a StepApplied or StepReverted event
    ///
    /// Durations beyond `u64::MAX` milliseconds saturate.
    pub fn completed(step: &MigrationStep, direction: Direction, duration: Duration) -> Self {
        let data = StepCompletedEvent {
            step: step.id(),
            name: step.name().to_string(),
            operations: step.forward().len(),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            timestamp: Utc::now(),
        };
        match direction {
            Direction::Up => MigrationEvent::StepApplied(data),
            Direction::Down => MigrationEvent::StepReverted(data),
        }
    }

    /// Create a StepFailed event
    pub fn failed(step: &MigrationStep, direction: Direction, error: &impl ToString) -> Self {
        MigrationEvent::StepFailed(StepFailedEvent {
            step: step.id(),
            name: step.name().to_string(),
            direction,
            error: error.to_string(),
            timestamp: Utc::now(),
        })
    }
}
