//! Catalog validation

use crate::contract::MigrationError;
use super::step::MigrationStep;

/// Validate step identifiers and names.
///
/// Ids must be strictly ascending 14-digit timestamps (`yyyyMMddHHmmss`);
/// names must be PascalCase identifiers; every step must change something.
pub fn validate_steps(steps: &[MigrationStep]) -> Result<(), MigrationError> {
    let mut previous: Option<&MigrationStep> = None;
    for step in steps {
        validate_timestamp(step.id().0).map_err(|detail| {
            MigrationError::InvalidCatalog(format!("{}: {}", step.label(), detail))
        })?;
        validate_name(step.name()).map_err(|detail| {
            MigrationError::InvalidCatalog(format!("{}: {}", step.label(), detail))
        })?;
        if step.forward().is_empty() {
            return Err(MigrationError::InvalidCatalog(format!(
                "{} has no operations",
                step.label()
            )));
        }
        if let Some(prev) = previous {
            if step.id() <= prev.id() {
                return Err(MigrationError::InvalidCatalog(format!(
                    "{} must sort after {}",
                    step.label(),
                    prev.label()
                )));
            }
        }
        previous = Some(step);
    }
    Ok(())
}

fn validate_timestamp(id: u64) -> Result<(), String> {
    let digits = format!("{:014}", id);
    if digits.len() != 14 {
        return Err("id must have 14 digits".to_string());
    }
    let part = |from: usize, to: usize| digits[from..to].parse::<u32>().unwrap_or(u32::MAX);
    let (month, day, hour, minute, second) =
        (part(4, 6), part(6, 8), part(8, 10), part(10, 12), part(12, 14));
    if part(0, 4) < 2000 {
        return Err("year must be 2000 or later".to_string());
    }
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err("month/day out of range".to_string());
    }
    if hour > 23 || minute > 59 || second > 59 {
        return Err("time of day out of range".to_string());
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), String> {
    let first = name
        .chars()
        .next()
        .ok_or_else(|| "name cannot be empty".to_string())?;
    if !first.is_ascii_uppercase() {
        return Err(format!("name '{}' must start with an uppercase letter", name));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("name '{}' must be alphanumeric", name));
    }
    Ok(())
}
