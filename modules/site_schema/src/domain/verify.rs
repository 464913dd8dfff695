//! Rollback verification
//!
//! Replays the catalog on the model schema and checks that every step's
//! backward operations restore the exact prior schema, that the full
//! history unwinds to nothing, and that tenant isolation holds at every
//! version.

use crate::contract::model::Schema;
use crate::contract::MigrationError;
use super::diff::diff;
use super::ops::apply_all;
use super::step::{Catalog, MigrationStep};
use super::tenancy::TenancyPolicy;

/// Outcome of a full catalog verification
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub steps_checked: usize,
    /// `(step label, finding)` pairs; empty when the catalog is sound
    pub findings: Vec<(String, String)>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    /// Convert into an error when anything was found
    pub fn into_result(self) -> Result<Self, MigrationError> {
        if self.is_ok() {
            return Ok(self);
        }
        Err(MigrationError::Verification {
            subject: "migration catalog".to_string(),
            findings: self
                .findings
                .iter()
                .map(|(step, finding)| format!("{}: {}", step, finding))
                .collect(),
        })
    }
}

/// Apply `step` forward then backward on `base` and compare.
///
/// Returns the schema after the forward pass so callers can keep replaying.
pub fn verify_step(base: &Schema, step: &MigrationStep) -> Result<Schema, MigrationError> {
    let mut forward = base.clone();
    apply_all(&mut forward, step.forward())?;

    let mut reverted = forward.clone();
    apply_all(&mut reverted, &step.backward())?;

    if !reverted.structurally_eq(base) {
        return Err(MigrationError::Verification {
            subject: step.label(),
            findings: diff(base, &reverted)
                .iter()
                .map(|op| format!("revert left drift: {}", op.describe()))
                .collect(),
        });
    }
    Ok(forward)
}

/// Verify every step of the catalog plus the full round trip
pub fn verify_catalog(catalog: &Catalog, policy: &TenancyPolicy) -> VerificationReport {
    let mut report = VerificationReport::default();
    let mut schema = Schema::empty();

    for step in catalog.steps() {
        tracing::debug!(step = %step.label(), "Verifying migration step");
        match verify_step(&schema, step) {
            Ok(next) => schema = next,
            Err(err) => {
                report.findings.push((step.label(), err.to_string()));
                return report;
            }
        }
        report.steps_checked += 1;
        for violation in policy.check(&schema) {
            report
                .findings
                .push((step.label(), format!("tenant isolation: {}", violation)));
        }
    }

    for step in catalog.steps().iter().rev() {
        if let Err(err) = apply_all(&mut schema, &step.backward()) {
            report
                .findings
                .push((step.label(), format!("full rollback failed: {}", err)));
            return report;
        }
    }
    if !schema.is_empty() {
        let leftover: Vec<String> = schema.tables().map(|t| t.name.clone()).collect();
        report.findings.push((
            "full rollback".to_string(),
            format!("tables left behind: {}", leftover.join(", ")),
        ));
    }
    report
}
