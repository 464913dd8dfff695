//! Tenant isolation invariant
//!
//! Every tenant-scoped table must carry a NOT NULL tenant column with a
//! cascading foreign key to the tenant root and an index leading with that
//! column. This is the isolation boundary for the whole site.

use crate::contract::model::{ReferentialAction, Schema, Table};
use std::fmt;

/// Which tables are tenant-scoped and what they must reference
#[derive(Debug, Clone)]
pub struct TenancyPolicy {
    pub tenant_table: String,
    pub tenant_column: String,
    /// Tables that carry the tenant column but are exempt from the check
    pub exempt: Vec<String>,
}

impl Default for TenancyPolicy {
    fn default() -> Self {
        Self {
            tenant_table: "Companies".to_string(),
            tenant_column: "CompanyId".to_string(),
            exempt: Vec::new(),
        }
    }
}

/// A broken tenant isolation rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenancyViolation {
    pub table: String,
    pub rule: TenancyRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenancyRule {
    NullableTenantColumn,
    MissingCascadeForeignKey,
    MissingTenantIndex,
}

impl fmt::Display for TenancyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self.rule {
            TenancyRule::NullableTenantColumn => "tenant column is nullable",
            TenancyRule::MissingCascadeForeignKey => "no cascading foreign key to the tenant table",
            TenancyRule::MissingTenantIndex => "no index leading with the tenant column",
        };
        write!(f, "\"{}\": {}", self.table, rule)
    }
}

impl TenancyPolicy {
    /// Tables the policy applies to
    pub fn is_tenant_scoped(&self, table: &Table) -> bool {
        table.name != self.tenant_table
            && !self.exempt.contains(&table.name)
            && table.find_column(&self.tenant_column).is_some()
    }

    pub fn check_table(&self, table: &Table) -> Vec<TenancyViolation> {
        let mut violations = Vec::new();
        if !self.is_tenant_scoped(table) {
            return violations;
        }
        let violation = |rule| TenancyViolation {
            table: table.name.clone(),
            rule,
        };

        if table
            .find_column(&self.tenant_column)
            .is_some_and(|c| c.nullable)
        {
            violations.push(violation(TenancyRule::NullableTenantColumn));
        }

        let has_cascade = table.foreign_keys.iter().any(|k| {
            k.columns == [self.tenant_column.as_str()]
                && k.referenced_table == self.tenant_table
                && k.on_delete == ReferentialAction::Cascade
        });
        if !has_cascade {
            violations.push(violation(TenancyRule::MissingCascadeForeignKey));
        }

        let leads = |columns: &[String]| columns.first() == Some(&self.tenant_column);
        let has_index = table.indexes.iter().any(|i| i.filter.is_none() && leads(&i.columns))
            || table.primary_key.as_ref().is_some_and(|pk| leads(&pk.columns));
        if !has_index {
            violations.push(violation(TenancyRule::MissingTenantIndex));
        }
        violations
    }

    pub fn check(&self, schema: &Schema) -> Vec<TenancyViolation> {
        schema.tables().flat_map(|t| self.check_table(t)).collect()
    }
}
