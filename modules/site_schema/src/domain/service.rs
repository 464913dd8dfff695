//! Domain service - migration orchestration

use crate::contract::model::{AppliedStep, MigrationStatus, RunReport, Schema, StepId, StepOutcome};
use crate::contract::MigrationError;
use super::events::{EventPublisher, MigrationEvent};
use super::ledger::{Ledger, LedgerEntry, StepPlan};
use super::ops::apply_all;
use super::repository::SchemaRepository;
use super::step::{Catalog, Direction, MigrationStep};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Domain service for applying and reverting migration steps
pub struct Service {
    catalog: Arc<Catalog>,
    repo: Arc<dyn SchemaRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    /// Serializes runs within this process. Separate processes must be
    /// kept apart by the deployment harness.
    run_lock: Mutex<()>,
}

impl Service {
    /// Create a new service instance
    pub fn new(
        catalog: Arc<Catalog>,
        repo: Arc<dyn SchemaRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            catalog,
            repo,
            event_publisher,
            run_lock: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current ledger position relative to the catalog
    pub async fn status(&self) -> Result<MigrationStatus, MigrationError> {
        let ledger = self.load_checked_ledger().await?;
        Ok(MigrationStatus {
            current: ledger.current(),
            applied: ledger
                .entries()
                .iter()
                .map(|e| AppliedStep {
                    id: e.id,
                    name: e.name.clone(),
                    applied_at: e.applied_at,
                })
                .collect(),
            pending: ledger
                .pending(&self.catalog)
                .iter()
                .map(MigrationStep::label)
                .collect(),
        })
    }

    /// Apply every pending step in order, stopping at the first failure
    pub async fn up(&self) -> Result<RunReport, MigrationError> {
        let _guard = self.run_lock.lock().await;
        let mut ledger = self.load_checked_ledger().await?;
        let mut model = self.catalog.schema_at(ledger.len())?;
        let mut report = RunReport::default();

        let pending: Vec<MigrationStep> = ledger.pending(&self.catalog).to_vec();
        tracing::info!(pending = pending.len(), "Applying pending migrations");
        for step in &pending {
            self.run_step(&mut ledger, &mut model, step, Direction::Up).await?;
            report.outcomes.push(StepOutcome::Applied(step.id()));
        }
        report.current = ledger.current();
        Ok(report)
    }

    /// Revert the `count` most recently applied steps, newest first
    pub async fn down(&self, count: usize) -> Result<RunReport, MigrationError> {
        let _guard = self.run_lock.lock().await;
        let mut ledger = self.load_checked_ledger().await?;
        let mut model = self.catalog.schema_at(ledger.len())?;
        let mut report = RunReport::default();

        for _ in 0..count {
            let Some(current) = ledger.current() else {
                break;
            };
            let step = self.catalog.get(current)?.clone();
            self.run_step(&mut ledger, &mut model, &step, Direction::Down).await?;
            report.outcomes.push(StepOutcome::Reverted(step.id()));
        }
        report.current = ledger.current();
        Ok(report)
    }

    /// Apply one step. Re-applying an applied step is a reported no-op.
    pub async fn apply(&self, id: StepId) -> Result<RunReport, MigrationError> {
        let _guard = self.run_lock.lock().await;
        let mut ledger = self.load_checked_ledger().await?;

        let outcome = match ledger.plan_apply(&self.catalog, id)? {
            StepPlan::AlreadyApplied | StepPlan::AlreadyReverted => {
                tracing::info!(step = %id, "Step already applied");
                StepOutcome::AlreadyApplied(id)
            }
            StepPlan::Ready => {
                let mut model = self.catalog.schema_at(ledger.len())?;
                let step = self.catalog.get(id)?.clone();
                self.run_step(&mut ledger, &mut model, &step, Direction::Up).await?;
                StepOutcome::Applied(id)
            }
        };
        Ok(RunReport {
            outcomes: vec![outcome],
            current: ledger.current(),
        })
    }

    /// Revert one step. Reverting a step that is not applied is a reported
    /// no-op.
    pub async fn revert(&self, id: StepId) -> Result<RunReport, MigrationError> {
        let _guard = self.run_lock.lock().await;
        let mut ledger = self.load_checked_ledger().await?;

        let outcome = match ledger.plan_revert(&self.catalog, id)? {
            StepPlan::AlreadyReverted | StepPlan::AlreadyApplied => {
                tracing::info!(step = %id, "Step not applied, nothing to revert");
                StepOutcome::AlreadyReverted(id)
            }
            StepPlan::Ready => {
                let mut model = self.catalog.schema_at(ledger.len())?;
                let step = self.catalog.get(id)?.clone();
                self.run_step(&mut ledger, &mut model, &step, Direction::Down).await?;
                StepOutcome::Reverted(id)
            }
        };
        Ok(RunReport {
            outcomes: vec![outcome],
            current: ledger.current(),
        })
    }

    async fn load_checked_ledger(&self) -> Result<Ledger, MigrationError> {
        let ledger = self.repo.load_ledger().await?;
        ledger.check_against(&self.catalog)?;
        Ok(ledger)
    }

    /// Validate on the model, execute on the repository, then advance the
    /// ledger and the model together
    async fn run_step(
        &self,
        ledger: &mut Ledger,
        model: &mut Schema,
        step: &MigrationStep,
        direction: Direction,
    ) -> Result<(), MigrationError> {
        let ops = step.ops(direction);
        let mut next = model.clone();
        if let Err(err) = apply_all(&mut next, &ops) {
            self.publish(MigrationEvent::failed(step, direction, &err)).await;
            return Err(err);
        }

        let entry = match direction {
            Direction::Up => LedgerEntry {
                id: step.id(),
                name: step.name().to_string(),
                checksum: step.checksum()?,
                applied_at: Utc::now(),
            },
            Direction::Down => ledger
                .entries()
                .iter()
                .find(|e| e.id == step.id())
                .cloned()
                .ok_or(MigrationError::UnknownStep { step: step.id() })?,
        };

        tracing::info!(
            step = %step.label(),
            direction = %direction,
            operations = ops.len(),
            backend = self.repo.backend(),
            "Executing migration step"
        );
        let started = Instant::now();
        if let Err(err) = self.repo.execute(step, direction, &entry).await {
            tracing::error!(step = %step.label(), direction = %direction, error = %err, "Migration step rolled back");
            self.publish(MigrationEvent::failed(step, direction, &err)).await;
            return Err(err);
        }
        let elapsed = started.elapsed();

        match direction {
            Direction::Up => ledger.record_applied(entry),
            Direction::Down => {
                ledger.record_reverted(step.id());
            }
        }
        *model = next;

        self.publish(MigrationEvent::completed(step, direction, elapsed)).await;
        Ok(())
    }

    async fn publish(&self, event: MigrationEvent) {
        if let Err(e) = self.event_publisher.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish migration event");
        }
    }
}
