//! Declarative schema diff
//!
//! Computes the operation list that turns one schema snapshot into another.
//! Renames are not inferred: a renamed table or column shows up as a drop
//! plus a create.

use crate::contract::model::{Schema, Table};
use super::ops::SchemaOp;
use std::collections::HashSet;

/// Operations transforming `from` into `to`.
///
/// Ordering: constraints that go away are dropped first, then tables, then
/// columns change, then new tables are created in foreign-key dependency
/// order, and finally new keys, indexes and foreign keys are added.
pub fn diff(from: &Schema, to: &Schema) -> Vec<SchemaOp> {
    let mut ops = Vec::new();

    let removed: Vec<&Table> = from.tables().filter(|t| !to.contains_table(&t.name)).collect();
    let added: Vec<&Table> = to.tables().filter(|t| !from.contains_table(&t.name)).collect();
    let kept: Vec<(&Table, &Table)> = from
        .tables()
        .filter_map(|old| to.table(&old.name).map(|new| (old, new)))
        .collect();

    let pk_changed: HashSet<&str> = kept
        .iter()
        .filter(|(old, new)| old.primary_key != new.primary_key)
        .map(|(old, _)| old.name.as_str())
        .collect();

    // Foreign keys that change, or that point at a key about to be rebuilt
    let mut fks_to_add = Vec::new();
    for (old, new) in &kept {
        for key in &old.foreign_keys {
            let unchanged = new.find_foreign_key(&key.name) == Some(key);
            if !unchanged || pk_changed.contains(key.referenced_table.as_str()) {
                ops.push(SchemaOp::drop_foreign_key(old.name.as_str(), key.clone()));
            }
        }
        for key in &new.foreign_keys {
            let unchanged = old.find_foreign_key(&key.name) == Some(key);
            if !unchanged || pk_changed.contains(key.referenced_table.as_str()) {
                fks_to_add.push(SchemaOp::add_foreign_key(new.name.as_str(), key.clone()));
            }
        }
    }

    let mut indexes_to_add = Vec::new();
    for (old, new) in &kept {
        for index in &old.indexes {
            if new.find_index(&index.name) != Some(index) {
                ops.push(SchemaOp::drop_index(old.name.as_str(), index.clone()));
            }
        }
        for index in &new.indexes {
            if old.find_index(&index.name) != Some(index) {
                indexes_to_add.push(SchemaOp::create_index(new.name.as_str(), index.clone()));
            }
        }
    }

    let mut pks_to_add = Vec::new();
    for (old, new) in &kept {
        if old.primary_key != new.primary_key {
            if let Some(key) = &old.primary_key {
                ops.push(SchemaOp::drop_primary_key(old.name.as_str(), key.clone()));
            }
            if let Some(key) = &new.primary_key {
                pks_to_add.push(SchemaOp::add_primary_key(new.name.as_str(), key.clone()));
            }
        }
    }

    for table in creation_order(&removed).into_iter().rev() {
        ops.push(SchemaOp::drop_table(table.clone()));
    }

    for (old, new) in &kept {
        for column in &new.columns {
            match old.find_column(&column.name) {
                None => ops.push(SchemaOp::add_column(new.name.as_str(), column.clone())),
                Some(existing) if existing != column => ops.push(SchemaOp::alter_column(
                    new.name.as_str(),
                    existing.clone(),
                    column.clone(),
                )),
                Some(_) => {}
            }
        }
        for column in &old.columns {
            if new.find_column(&column.name).is_none() {
                ops.push(SchemaOp::drop_column(old.name.as_str(), column.clone()));
            }
        }
    }

    ops.extend(pks_to_add);

    for table in creation_order(&added) {
        ops.push(SchemaOp::create_table(table.clone()));
    }

    ops.extend(indexes_to_add);
    ops.extend(fks_to_add);
    ops
}

/// Tables ordered so each one comes after the tables it references.
///
/// References outside `tables` are assumed to exist already. Cycles are
/// broken by name order.
fn creation_order<'a>(tables: &[&'a Table]) -> Vec<&'a Table> {
    let names: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::with_capacity(tables.len());
    let mut remaining: Vec<&'a Table> = tables.to_vec();

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|t| {
            t.foreign_keys.iter().all(|k| {
                k.referenced_table == t.name
                    || !names.contains(k.referenced_table.as_str())
                    || placed.contains(k.referenced_table.as_str())
            })
        });
        let next = remaining.remove(ready.unwrap_or(0));
        placed.insert(next.name.as_str());
        ordered.push(next);
    }
    ordered
}
