//! Schema operation vocabulary
//!
//! Each operation carries the full prior shape of whatever it changes, so
//! `inverse()` is exact: applying an operation and then its inverse yields a
//! structurally identical schema.

use crate::contract::model::{
    Column, ForeignKey, Index, Literal, Narrowing, PrimaryKey, ReferentialAction, Schema, Table,
};
use crate::contract::{Location, MigrationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rule that makes a narrowing alteration safe for existing rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum DataRule {
    /// Cut values longer than the new maximum length
    Truncate,
    /// Replace NULLs with a literal before NOT NULL is enforced
    Backfill(Literal),
    /// Convert values with a SQL expression (PostgreSQL `USING`)
    Convert(String),
}

impl DataRule {
    pub fn covers(&self, narrowing: &Narrowing) -> bool {
        matches!(
            (self, narrowing),
            (DataRule::Truncate, Narrowing::Length { .. })
                | (DataRule::Backfill(_), Narrowing::Nullability)
                | (DataRule::Convert(_), Narrowing::Type { .. })
                | (DataRule::Convert(_), Narrowing::Length { .. })
        )
    }
}

/// A single reversible schema change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchemaOp {
    CreateTable {
        table: Table,
    },
    DropTable {
        table: Table,
    },
    RenameTable {
        from: String,
        to: String,
    },
    AddColumn {
        table: String,
        column: Column,
    },
    DropColumn {
        table: String,
        column: Column,
    },
    /// `from` is the exact current shape; `up_rules` apply to this
    /// direction, `down_rules` to the inverse
    AlterColumn {
        table: String,
        from: Column,
        to: Column,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        up_rules: Vec<DataRule>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        down_rules: Vec<DataRule>,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    AddPrimaryKey {
        table: String,
        key: PrimaryKey,
    },
    DropPrimaryKey {
        table: String,
        key: PrimaryKey,
    },
    AddForeignKey {
        table: String,
        key: ForeignKey,
    },
    DropForeignKey {
        table: String,
        key: ForeignKey,
    },
    CreateIndex {
        table: String,
        index: Index,
    },
    DropIndex {
        table: String,
        index: Index,
    },
    RenameIndex {
        table: String,
        from: String,
        to: String,
    },
}

impl SchemaOp {
    pub fn create_table(table: Table) -> Self {
        Self::CreateTable { table }
    }

    pub fn drop_table(table: Table) -> Self {
        Self::DropTable { table }
    }

    pub fn rename_table(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RenameTable {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    pub fn drop_column(table: impl Into<String>, column: Column) -> Self {
        Self::DropColumn {
            table: table.into(),
            column,
        }
    }

    pub fn alter_column(table: impl Into<String>, from: Column, to: Column) -> Self {
        Self::AlterColumn {
            table: table.into(),
            from,
            to,
            up_rules: Vec::new(),
            down_rules: Vec::new(),
        }
    }

    /// Attach a data rule to the forward direction of an alter column
    pub fn with_up_rule(mut self, rule: DataRule) -> Self {
        if let Self::AlterColumn { up_rules, .. } = &mut self {
            up_rules.push(rule);
        }
        self
    }

    /// Attach a data rule to the reverse direction of an alter column
    pub fn with_down_rule(mut self, rule: DataRule) -> Self {
        if let Self::AlterColumn { down_rules, .. } = &mut self {
            down_rules.push(rule);
        }
        self
    }

    pub fn rename_column(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::RenameColumn {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn add_primary_key(table: impl Into<String>, key: PrimaryKey) -> Self {
        Self::AddPrimaryKey {
            table: table.into(),
            key,
        }
    }

    pub fn drop_primary_key(table: impl Into<String>, key: PrimaryKey) -> Self {
        Self::DropPrimaryKey {
            table: table.into(),
            key,
        }
    }

    pub fn add_foreign_key(table: impl Into<String>, key: ForeignKey) -> Self {
        Self::AddForeignKey {
            table: table.into(),
            key,
        }
    }

    pub fn drop_foreign_key(table: impl Into<String>, key: ForeignKey) -> Self {
        Self::DropForeignKey {
            table: table.into(),
            key,
        }
    }

    pub fn create_index(table: impl Into<String>, index: Index) -> Self {
        Self::CreateIndex {
            table: table.into(),
            index,
        }
    }

    pub fn drop_index(table: impl Into<String>, index: Index) -> Self {
        Self::DropIndex {
            table: table.into(),
            index,
        }
    }

    pub fn rename_index(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::RenameIndex {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Exact inverse of this operation
    pub fn inverse(&self) -> SchemaOp {
        match self.clone() {
            Self::CreateTable { table } => Self::DropTable { table },
            Self::DropTable { table } => Self::CreateTable { table },
            Self::RenameTable { from, to } => Self::RenameTable { from: to, to: from },
            Self::AddColumn { table, column } => Self::DropColumn { table, column },
            Self::DropColumn { table, column } => Self::AddColumn { table, column },
            Self::AlterColumn {
                table,
                from,
                to,
                up_rules,
                down_rules,
            } => Self::AlterColumn {
                table,
                from: to,
                to: from,
                up_rules: down_rules,
                down_rules: up_rules,
            },
            Self::RenameColumn { table, from, to } => Self::RenameColumn {
                table,
                from: to,
                to: from,
            },
            Self::AddPrimaryKey { table, key } => Self::DropPrimaryKey { table, key },
            Self::DropPrimaryKey { table, key } => Self::AddPrimaryKey { table, key },
            Self::AddForeignKey { table, key } => Self::DropForeignKey { table, key },
            Self::DropForeignKey { table, key } => Self::AddForeignKey { table, key },
            Self::CreateIndex { table, index } => Self::DropIndex { table, index },
            Self::DropIndex { table, index } => Self::CreateIndex { table, index },
            Self::RenameIndex { table, from, to } => Self::RenameIndex {
                table,
                from: to,
                to: from,
            },
        }
    }

    /// Table the operation targets (the source name for renames)
    pub fn table_name(&self) -> &str {
        match self {
            Self::CreateTable { table } | Self::DropTable { table } => &table.name,
            Self::RenameTable { from, .. } => from,
            Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::AddPrimaryKey { table, .. }
            | Self::DropPrimaryKey { table, .. }
            | Self::AddForeignKey { table, .. }
            | Self::DropForeignKey { table, .. }
            | Self::CreateIndex { table, .. }
            | Self::DropIndex { table, .. }
            | Self::RenameIndex { table, .. } => table,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Self::AddColumn { table, column } | Self::DropColumn { table, column } => {
                Location::column(table.as_str(), column.name.as_str())
            }
            Self::AlterColumn { table, from, .. } => Location::column(table.as_str(), from.name.as_str()),
            Self::RenameColumn { table, from, .. } => Location::column(table.as_str(), from.as_str()),
            other => Location::table(other.table_name()),
        }
    }

    /// Human-readable operation label used in logs and errors
    pub fn describe(&self) -> String {
        match self {
            Self::CreateTable { table } => format!("create table \"{}\"", table.name),
            Self::DropTable { table } => format!("drop table \"{}\"", table.name),
            Self::RenameTable { from, to } => format!("rename table \"{}\" to \"{}\"", from, to),
            Self::AddColumn { column, .. } => format!("add column \"{}\"", column.name),
            Self::DropColumn { column, .. } => format!("drop column \"{}\"", column.name),
            Self::AlterColumn { from, .. } => format!("alter column \"{}\"", from.name),
            Self::RenameColumn { from, to, .. } => {
                format!("rename column \"{}\" to \"{}\"", from, to)
            }
            Self::AddPrimaryKey { key, .. } => format!("add primary key \"{}\"", key.name),
            Self::DropPrimaryKey { key, .. } => format!("drop primary key \"{}\"", key.name),
            Self::AddForeignKey { key, .. } => format!("add foreign key \"{}\"", key.name),
            Self::DropForeignKey { key, .. } => format!("drop foreign key \"{}\"", key.name),
            Self::CreateIndex { index, .. } => format!("create index \"{}\"", index.name),
            Self::DropIndex { index, .. } => format!("drop index \"{}\"", index.name),
            Self::RenameIndex { from, to, .. } => {
                format!("rename index \"{}\" to \"{}\"", from, to)
            }
        }
    }

    /// Apply the operation to a model schema.
    ///
    /// Fails without modifying `schema` when the current shape does not
    /// match what the operation expects.
    pub fn apply(&self, schema: &mut Schema) -> Result<(), MigrationError> {
        let conflict = |detail: String| MigrationError::conflict(self.describe(), self.location(), detail);

        match self {
            Self::CreateTable { table } => {
                if schema.contains_table(&table.name) {
                    return Err(conflict("table already exists".into()));
                }
                validate_new_table(schema, table).map_err(conflict)?;
                schema.insert_table(table.clone());
            }
            Self::DropTable { table } => {
                let current = existing_table(schema, &table.name).map_err(conflict)?;
                if current.normalized() != table.normalized() {
                    return Err(conflict(
                        "table shape differs from the recorded definition".into(),
                    ));
                }
                if let Some((other, key)) = schema.references_to(&table.name).next() {
                    return Err(conflict(format!(
                        "still referenced by foreign key \"{}\" on \"{}\"",
                        key.name, other.name
                    )));
                }
                schema.remove_table(&table.name);
            }
            Self::RenameTable { from, to } => {
                let mut table = existing_table(schema, from).map_err(conflict)?.clone();
                if schema.contains_table(to) {
                    return Err(conflict(format!("table \"{}\" already exists", to)));
                }
                schema.remove_table(from);
                table.name = to.clone();
                schema.insert_table(table);
                let names: Vec<String> = schema.tables().map(|t| t.name.clone()).collect();
                for name in names {
                    if let Some(t) = schema.table_mut(&name) {
                        for key in t.foreign_keys.iter_mut() {
                            if key.referenced_table == *from {
                                key.referenced_table = to.clone();
                            }
                        }
                    }
                }
            }
            Self::AddColumn { table, column } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if current.find_column(&column.name).is_some() {
                    return Err(conflict("column already exists".into()));
                }
                if !column.nullable && column.default.is_none() && !column.identity {
                    return Err(MigrationError::incompatible(
                        self.describe(),
                        self.location(),
                        "NOT NULL column without a default cannot be added to existing rows",
                    ));
                }
                table_mut(schema, table)?.columns.push(column.clone());
            }
            Self::DropColumn { table, column } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                match current.find_column(&column.name) {
                    None => return Err(conflict("column does not exist".into())),
                    Some(found) if found != column => {
                        return Err(conflict(format!(
                            "column shape differs from the recorded definition: found {}",
                            column_shape(found)
                        )))
                    }
                    Some(_) => {}
                }
                if let Some(constraint) = current.constraint_using(&column.name) {
                    return Err(conflict(format!("column is still used by \"{}\"", constraint)));
                }
                if let Some((other, key)) = schema
                    .references_to(table)
                    .find(|(_, k)| k.referenced_columns.contains(&column.name))
                {
                    return Err(conflict(format!(
                        "column is referenced by foreign key \"{}\" on \"{}\"",
                        key.name, other.name
                    )));
                }
                table_mut(schema, table)?.columns.retain(|c| c.name != column.name);
            }
            Self::AlterColumn {
                table,
                from,
                to,
                up_rules,
                ..
            } => {
                if from.name != to.name {
                    return Err(conflict(
                        "alter column cannot rename; use rename column".into(),
                    ));
                }
                if from.identity != to.identity {
                    return Err(conflict("identity cannot be altered in place".into()));
                }
                let current = existing_table(schema, table).map_err(conflict)?;
                match current.find_column(&from.name) {
                    None => return Err(conflict("column does not exist".into())),
                    Some(found) if found != from => {
                        return Err(conflict(format!(
                            "expected {} but found {}",
                            column_shape(from),
                            column_shape(found)
                        )))
                    }
                    Some(_) => {}
                }
                if to.nullable {
                    if let Some(pk) = &current.primary_key {
                        if pk.columns.contains(&to.name) {
                            return Err(conflict(format!(
                                "column is part of primary key \"{}\"",
                                pk.name
                            )));
                        }
                    }
                }
                for narrowing in from.narrowings_to(to) {
                    if !up_rules.iter().any(|rule| rule.covers(&narrowing)) {
                        return Err(MigrationError::incompatible(
                            self.describe(),
                            self.location(),
                            format!("{} without a data rule", narrowing),
                        ));
                    }
                }
                let target = table_mut(schema, table)?;
                if let Some(column) = target.columns.iter_mut().find(|c| c.name == from.name) {
                    *column = to.clone();
                }
            }
            Self::RenameColumn { table, from, to } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if current.find_column(from).is_none() {
                    return Err(conflict("column does not exist".into()));
                }
                if current.find_column(to).is_some() {
                    return Err(conflict(format!("column \"{}\" already exists", to)));
                }
                let quoted = format!("\"{}\"", from);
                if let Some(index) = current
                    .indexes
                    .iter()
                    .find(|i| i.filter.as_deref().is_some_and(|f| f.contains(&quoted)))
                {
                    return Err(conflict(format!(
                        "filter predicate of index \"{}\" mentions the column",
                        index.name
                    )));
                }
                rename_column_in(table_mut(schema, table)?, from, to);
                let names: Vec<String> = schema.tables().map(|t| t.name.clone()).collect();
                for name in names {
                    if let Some(t) = schema.table_mut(&name) {
                        for key in t.foreign_keys.iter_mut().filter(|k| k.referenced_table == *table) {
                            rename_in(&mut key.referenced_columns, from, to);
                        }
                    }
                }
            }
            Self::AddPrimaryKey { table, key } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if let Some(pk) = &current.primary_key {
                    return Err(conflict(format!("primary key \"{}\" already exists", pk.name)));
                }
                validate_key_columns(current, key).map_err(conflict)?;
                table_mut(schema, table)?.primary_key = Some(key.clone());
            }
            Self::DropPrimaryKey { table, key } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if current.primary_key.as_ref() != Some(key) {
                    return Err(conflict(format!(
                        "primary key \"{}\" does not match the recorded definition",
                        key.name
                    )));
                }
                if let Some((other, fk)) = schema
                    .references_to(table)
                    .find(|(_, k)| k.referenced_columns == key.columns)
                {
                    return Err(conflict(format!(
                        "primary key is referenced by foreign key \"{}\" on \"{}\"",
                        fk.name, other.name
                    )));
                }
                table_mut(schema, table)?.primary_key = None;
            }
            Self::AddForeignKey { table, key } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if current.find_foreign_key(&key.name).is_some() {
                    return Err(conflict(format!("foreign key \"{}\" already exists", key.name)));
                }
                validate_foreign_key(schema, current, key).map_err(conflict)?;
                table_mut(schema, table)?.foreign_keys.push(key.clone());
            }
            Self::DropForeignKey { table, key } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if current.find_foreign_key(&key.name) != Some(key) {
                    return Err(conflict(format!(
                        "foreign key \"{}\" does not match the recorded definition",
                        key.name
                    )));
                }
                table_mut(schema, table)?.foreign_keys.retain(|k| k.name != key.name);
            }
            Self::CreateIndex { table, index } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if let Some((owner, _)) = schema.find_index(&index.name) {
                    return Err(conflict(format!(
                        "index \"{}\" already exists on \"{}\"",
                        index.name, owner.name
                    )));
                }
                validate_index(current, index).map_err(conflict)?;
                table_mut(schema, table)?.indexes.push(index.clone());
            }
            Self::DropIndex { table, index } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if current.find_index(&index.name) != Some(index) {
                    return Err(conflict(format!(
                        "index \"{}\" does not match the recorded definition",
                        index.name
                    )));
                }
                table_mut(schema, table)?.indexes.retain(|i| i.name != index.name);
            }
            Self::RenameIndex { table, from, to } => {
                let current = existing_table(schema, table).map_err(conflict)?;
                if current.find_index(from).is_none() {
                    return Err(conflict(format!("index \"{}\" does not exist", from)));
                }
                if schema.find_index(to).is_some() {
                    return Err(conflict(format!("index \"{}\" already exists", to)));
                }
                let target = table_mut(schema, table)?;
                if let Some(index) = target.indexes.iter_mut().find(|i| i.name == *from) {
                    index.name = to.clone();
                }
            }
        }
        Ok(())
    }
}

/// Apply operations in order; on failure the schema is left untouched
pub fn apply_all(schema: &mut Schema, ops: &[SchemaOp]) -> Result<(), MigrationError> {
    let mut working = schema.clone();
    for op in ops {
        op.apply(&mut working)?;
    }
    *schema = working;
    Ok(())
}

fn existing_table<'a>(schema: &'a Schema, name: &str) -> Result<&'a Table, String> {
    schema
        .table(name)
        .ok_or_else(|| format!("table \"{}\" does not exist", name))
}

fn table_mut<'a>(schema: &'a mut Schema, name: &str) -> Result<&'a mut Table, MigrationError> {
    schema.table_mut(name).ok_or_else(|| {
        MigrationError::conflict("lookup", Location::table(name), "table does not exist")
    })
}

fn column_shape(column: &Column) -> String {
    let mut shape = format!(
        "{} {}",
        column.ty,
        if column.nullable { "NULL" } else { "NOT NULL" }
    );
    if let Some(default) = &column.default {
        shape.push_str(&format!(" DEFAULT {}", default));
    }
    if column.identity {
        shape.push_str(" IDENTITY");
    }
    shape
}

fn rename_in(columns: &mut [String], from: &str, to: &str) {
    for column in columns.iter_mut().filter(|c| c.as_str() == from) {
        *column = to.to_string();
    }
}

fn rename_column_in(table: &mut Table, from: &str, to: &str) {
    if let Some(column) = table.columns.iter_mut().find(|c| c.name == from) {
        column.name = to.to_string();
    }
    if let Some(pk) = table.primary_key.as_mut() {
        rename_in(&mut pk.columns, from, to);
    }
    for key in table.foreign_keys.iter_mut() {
        rename_in(&mut key.columns, from, to);
    }
    for index in table.indexes.iter_mut() {
        rename_in(&mut index.columns, from, to);
    }
}

fn validate_new_table(schema: &Schema, table: &Table) -> Result<(), String> {
    let mut seen = HashSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            return Err(format!("duplicate column \"{}\"", column.name));
        }
    }
    if let Some(pk) = &table.primary_key {
        validate_key_columns(table, pk)?;
    }
    for key in &table.foreign_keys {
        if key.referenced_table == table.name {
            validate_foreign_key_target(table, table, key)?;
        } else {
            validate_foreign_key(schema, table, key)?;
        }
    }
    let mut index_names = HashSet::new();
    for index in &table.indexes {
        if !index_names.insert(index.name.as_str()) || schema.find_index(&index.name).is_some() {
            return Err(format!("index \"{}\" already exists", index.name));
        }
        validate_index(table, index)?;
    }
    Ok(())
}

fn validate_key_columns(table: &Table, key: &PrimaryKey) -> Result<(), String> {
    if key.columns.is_empty() {
        return Err(format!("primary key \"{}\" has no columns", key.name));
    }
    for name in &key.columns {
        match table.find_column(name) {
            None => return Err(format!("primary key column \"{}\" does not exist", name)),
            Some(column) if column.nullable => {
                return Err(format!("primary key column \"{}\" is nullable", name))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn validate_foreign_key(schema: &Schema, table: &Table, key: &ForeignKey) -> Result<(), String> {
    let target = schema
        .table(&key.referenced_table)
        .ok_or_else(|| format!("referenced table \"{}\" does not exist", key.referenced_table))?;
    validate_foreign_key_target(table, target, key)
}

fn validate_foreign_key_target(table: &Table, target: &Table, key: &ForeignKey) -> Result<(), String> {
    if key.columns.is_empty() || key.columns.len() != key.referenced_columns.len() {
        return Err(format!("foreign key \"{}\" has mismatched column lists", key.name));
    }
    for name in &key.columns {
        let column = table
            .find_column(name)
            .ok_or_else(|| format!("foreign key column \"{}\" does not exist", name))?;
        if key.on_delete == ReferentialAction::SetNull && !column.nullable {
            return Err(format!(
                "foreign key \"{}\" uses SET NULL on NOT NULL column \"{}\"",
                key.name, name
            ));
        }
    }
    let is_key = target
        .primary_key
        .as_ref()
        .is_some_and(|pk| pk.columns == key.referenced_columns)
        || target
            .indexes
            .iter()
            .any(|i| i.unique && i.filter.is_none() && i.columns == key.referenced_columns);
    if !is_key {
        return Err(format!(
            "foreign key \"{}\" must reference a primary key or unique index of \"{}\"",
            key.name, target.name
        ));
    }
    Ok(())
}

fn validate_index(table: &Table, index: &Index) -> Result<(), String> {
    if index.columns.is_empty() {
        return Err(format!("index \"{}\" has no columns", index.name));
    }
    for name in &index.columns {
        if table.find_column(name).is_none() {
            return Err(format!("index column \"{}\" does not exist", name));
        }
    }
    Ok(())
}
