//! DDL rendering
//!
//! Turns schema operations into SQL for PostgreSQL and SQLite. Statements
//! sea-query can express are built with it; the rest are written out by
//! hand in PostgreSQL syntax. Operations SQLite cannot express are rejected
//! for the whole step before anything is executed.

use crate::contract::model::{Column, ColumnType, DefaultValue, ForeignKey, Index, Literal, ReferentialAction, Table};
use crate::contract::MigrationError;
use crate::domain::ops::{DataRule, SchemaOp};
use crate::domain::step::{Direction, MigrationStep};
use sea_orm::sea_query::{
    Alias, ColumnDef, Expr, ForeignKey as ForeignKeyStmt, ForeignKeyAction,
    ForeignKeyCreateStatement, Index as IndexStmt, IndexCreateStatement, PostgresQueryBuilder,
    SchemaStatementBuilder, SqliteQueryBuilder, Table as TableStmt,
};
use sea_orm::DbBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    fn of(backend: DbBackend) -> Result<Self, MigrationError> {
        match backend {
            DbBackend::Postgres => Ok(Self::Postgres),
            DbBackend::Sqlite => Ok(Self::Sqlite),
            other => Err(MigrationError::Unsupported {
                backend: format!("{:?}", other),
                operation: "schema migrations".to_string(),
            }),
        }
    }

    fn build<S: SchemaStatementBuilder>(self, stmt: &S) -> String {
        match self {
            Self::Postgres => stmt.to_string(PostgresQueryBuilder),
            Self::Sqlite => stmt.to_string(SqliteQueryBuilder),
        }
    }
}

/// Backend name as used in `Unsupported` errors
pub fn backend_name(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "postgres",
        DbBackend::Sqlite => "sqlite",
        DbBackend::MySql => "mysql",
    }
}

/// SQL for every operation of `step` in `direction`, grouped per operation.
///
/// Fails with `Unsupported` if any operation cannot be rendered, so nothing
/// is executed for a step the backend cannot run.
pub fn render_step(
    step: &MigrationStep,
    direction: Direction,
    backend: DbBackend,
) -> Result<Vec<(SchemaOp, Vec<String>)>, MigrationError> {
    step.ops(direction)
        .into_iter()
        .map(|op| render(&op, backend).map(|sql| (op, sql)))
        .collect()
}

/// SQL statements implementing one operation
pub fn render(op: &SchemaOp, backend: DbBackend) -> Result<Vec<String>, MigrationError> {
    let dialect = Dialect::of(backend)?;
    let unsupported = || MigrationError::Unsupported {
        backend: backend_name(backend).to_string(),
        operation: op.describe(),
    };

    let sql = match op {
        SchemaOp::CreateTable { table } => {
            let mut statements = vec![dialect.build(&create_table(table, dialect))];
            statements.extend(table.indexes.iter().map(|i| create_index(&table.name, i, dialect)));
            statements
        }
        SchemaOp::DropTable { table } => {
            vec![dialect.build(TableStmt::drop().table(Alias::new(&table.name)))]
        }
        SchemaOp::RenameTable { from, to } => {
            vec![dialect.build(TableStmt::rename().table(Alias::new(from), Alias::new(to)))]
        }
        SchemaOp::AddColumn { table, column } => {
            if dialect == Dialect::Sqlite && column.identity {
                return Err(unsupported());
            }
            vec![dialect.build(
                TableStmt::alter()
                    .table(Alias::new(table))
                    .add_column(column_def(column, dialect, false)),
            )]
        }
        SchemaOp::DropColumn { table, column } => vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote(table),
            quote(&column.name)
        )],
        SchemaOp::AlterColumn {
            table,
            from,
            to,
            up_rules,
            ..
        } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported());
            }
            alter_column(table, from, to, up_rules)
        }
        SchemaOp::RenameColumn { table, from, to } => vec![format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote(table),
            quote(from),
            quote(to)
        )],
        SchemaOp::AddPrimaryKey { table, key } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported());
            }
            vec![format!(
                "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
                quote(table),
                quote(&key.name),
                quote_list(&key.columns)
            )]
        }
        SchemaOp::DropPrimaryKey { table, key } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported());
            }
            vec![drop_constraint(table, &key.name)]
        }
        SchemaOp::AddForeignKey { table, key } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported());
            }
            vec![dialect.build(&foreign_key(table, key))]
        }
        SchemaOp::DropForeignKey { table, key } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported());
            }
            vec![dialect.build(
                ForeignKeyStmt::drop()
                    .name(&key.name)
                    .table(Alias::new(table)),
            )]
        }
        SchemaOp::CreateIndex { table, index } => vec![create_index(table, index, dialect)],
        SchemaOp::DropIndex { index, .. } => {
            vec![dialect.build(IndexStmt::drop().name(&index.name))]
        }
        SchemaOp::RenameIndex { from, to, .. } => {
            if dialect == Dialect::Sqlite {
                return Err(unsupported());
            }
            vec![format!("ALTER INDEX {} RENAME TO {}", quote(from), quote(to))]
        }
    };
    Ok(sql)
}

fn create_table(table: &Table, dialect: Dialect) -> sea_orm::sea_query::TableCreateStatement {
    let mut stmt = TableStmt::create();
    stmt.table(Alias::new(&table.name));

    // SQLite only auto-increments an inline INTEGER PRIMARY KEY
    let inline_key = dialect == Dialect::Sqlite
        && table.primary_key.as_ref().is_some_and(|pk| {
            pk.columns.len() == 1
                && table
                    .find_column(&pk.columns[0])
                    .is_some_and(|c| c.identity)
        });

    for column in &table.columns {
        stmt.col(column_def(column, dialect, inline_key && column.identity));
    }
    if let Some(pk) = table.primary_key.as_ref().filter(|_| !inline_key) {
        let mut index = IndexStmt::create();
        index.name(&pk.name);
        for column in &pk.columns {
            index.col(Alias::new(column));
        }
        stmt.primary_key(&mut index);
    }
    for key in &table.foreign_keys {
        stmt.foreign_key(&mut foreign_key(&table.name, key));
    }
    stmt
}

fn column_def(column: &Column, dialect: Dialect, inline_key: bool) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(&column.name));
    match column.ty {
        ColumnType::Integer => def.integer(),
        ColumnType::BigInteger => def.big_integer(),
        ColumnType::Boolean => def.boolean(),
        ColumnType::Varchar(len) => def.string_len(len),
        ColumnType::Text => def.text(),
        ColumnType::Timestamp => def.timestamp_with_time_zone(),
        ColumnType::Json => def.json_binary(),
        ColumnType::Uuid => def.uuid(),
    };
    if column.nullable {
        def.null();
    } else {
        def.not_null();
    }
    match &column.default {
        Some(DefaultValue::Literal(Literal::Bool(v))) => {
            def.default(Expr::val(*v));
        }
        Some(DefaultValue::Literal(Literal::Int(v))) => {
            def.default(Expr::val(*v));
        }
        Some(DefaultValue::Literal(Literal::Str(v))) => {
            def.default(Expr::val(v.as_str()));
        }
        Some(DefaultValue::Sql(expr)) => {
            def.default(Expr::cust(expr.as_str()));
        }
        None => {}
    }
    if column.identity {
        match dialect {
            Dialect::Postgres => {
                def.extra("GENERATED BY DEFAULT AS IDENTITY");
            }
            Dialect::Sqlite if inline_key => {
                def.primary_key().auto_increment();
            }
            Dialect::Sqlite => {}
        }
    }
    def
}

fn foreign_key(table: &str, key: &ForeignKey) -> ForeignKeyCreateStatement {
    let mut stmt = ForeignKeyStmt::create();
    stmt.name(&key.name)
        .from_tbl(Alias::new(table))
        .to_tbl(Alias::new(&key.referenced_table))
        .on_delete(match key.on_delete {
            ReferentialAction::Cascade => ForeignKeyAction::Cascade,
            ReferentialAction::SetNull => ForeignKeyAction::SetNull,
            ReferentialAction::Restrict => ForeignKeyAction::Restrict,
            ReferentialAction::NoAction => ForeignKeyAction::NoAction,
        });
    for column in &key.columns {
        stmt.from_col(Alias::new(column));
    }
    for column in &key.referenced_columns {
        stmt.to_col(Alias::new(column));
    }
    stmt
}

fn create_index(table: &str, index: &Index, dialect: Dialect) -> String {
    let mut stmt: IndexCreateStatement = IndexStmt::create();
    stmt.name(&index.name).table(Alias::new(table));
    for column in &index.columns {
        stmt.col(Alias::new(column));
    }
    if index.unique {
        stmt.unique();
    }
    let mut sql = dialect.build(&stmt);
    if let Some(filter) = &index.filter {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    sql
}

/// PostgreSQL `ALTER COLUMN`, with data rules applied first
fn alter_column(table: &str, from: &Column, to: &Column, rules: &[DataRule]) -> Vec<String> {
    let prefix = format!("ALTER TABLE {} ALTER COLUMN {}", quote(table), quote(&to.name));
    let mut statements = Vec::new();

    if from.nullable && !to.nullable {
        if let Some(DataRule::Backfill(value)) = rules.iter().find(|r| matches!(r, DataRule::Backfill(_))) {
            statements.push(format!(
                "UPDATE {} SET {} = {} WHERE {} IS NULL",
                quote(table),
                quote(&to.name),
                value,
                quote(&to.name)
            ));
        }
    }

    if from.default.is_some() && from.default != to.default {
        statements.push(format!("{} DROP DEFAULT", prefix));
    }

    if from.ty != to.ty {
        let using = rules.iter().find_map(|rule| match (rule, to.ty) {
            (DataRule::Convert(expr), _) => Some(expr.clone()),
            (DataRule::Truncate, ColumnType::Varchar(len)) => {
                Some(format!("left({}, {})", quote(&to.name), len))
            }
            _ => None,
        });
        let mut sql = format!("{} TYPE {}", prefix, to.ty);
        if let Some(expr) = using {
            sql.push_str(&format!(" USING {}", expr));
        }
        statements.push(sql);
    }

    if from.nullable != to.nullable {
        let change = if to.nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
        statements.push(format!("{} {}", prefix, change));
    }

    if let Some(default) = &to.default {
        if from.default.as_ref() != Some(default) {
            statements.push(format!("{} SET DEFAULT {}", prefix, default));
        }
    }
    statements
}

fn drop_constraint(table: &str, name: &str) -> String {
    format!("ALTER TABLE {} DROP CONSTRAINT {}", quote(table), quote(name))
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_list(names: &[String]) -> String {
    names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(", ")
}
