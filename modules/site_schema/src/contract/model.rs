//! Schema data model
//!
//! Transport-agnostic description of a relational schema. Operations in
//! `domain::ops` mutate these values; the storage layer renders them to DDL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "length", rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    BigInteger,
    Boolean,
    /// Bounded string, length in characters
    Varchar(u32),
    Text,
    /// Timestamp with time zone
    Timestamp,
    Json,
    Uuid,
}

impl ColumnType {
    /// Whether every value of `self` fits into `target` without loss
    pub fn widens_to(self, target: ColumnType) -> bool {
        match (self, target) {
            (a, b) if a == b => true,
            (ColumnType::Varchar(from), ColumnType::Varchar(to)) => to >= from,
            (ColumnType::Varchar(_), ColumnType::Text) => true,
            (ColumnType::Integer, ColumnType::BigInteger) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::BigInteger => write!(f, "bigint"),
            Self::Boolean => write!(f, "boolean"),
            Self::Varchar(len) => write!(f, "varchar({})", len),
            Self::Text => write!(f, "text"),
            Self::Timestamp => write!(f, "timestamptz"),
            Self::Json => write!(f, "jsonb"),
            Self::Uuid => write!(f, "uuid"),
        }
    }
}

/// Literal value usable as a column default or backfill value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "'{}'", v.replace('\'', "''")),
        }
    }
}

/// Column default.
///
/// A literal default and a server-computed default are kept apart so that a
/// revert restores the original mechanism, not just an equal-looking value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Literal(Literal),
    /// SQL expression evaluated by the server, e.g. `CURRENT_TIMESTAMP`
    Sql(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{}", lit),
            Self::Sql(expr) => write!(f, "{}", expr),
        }
    }
}

/// Table column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Server-generated identity value
    #[serde(default)]
    pub identity: bool,
}

impl Column {
    /// NOT NULL column without default
    pub fn required(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: None,
            identity: false,
        }
    }

    /// Nullable column without default
    pub fn optional(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            nullable: true,
            ..Self::required(name, ty)
        }
    }

    pub fn with_default(mut self, value: Literal) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    pub fn with_sql_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Sql(expr.into()));
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Ways in which changing this column into `target` can reject or lose
    /// existing rows
    pub fn narrowings_to(&self, target: &Column) -> Vec<Narrowing> {
        let mut found = Vec::new();
        if !self.ty.widens_to(target.ty) {
            match (self.ty, target.ty) {
                (ColumnType::Varchar(_) | ColumnType::Text, ColumnType::Varchar(to)) => {
                    found.push(Narrowing::Length { to })
                }
                (from, to) => found.push(Narrowing::Type { from, to }),
            }
        }
        if self.nullable && !target.nullable {
            found.push(Narrowing::Nullability);
        }
        found
    }
}

/// A change that existing rows may not satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrowing {
    /// Shorter maximum length
    Length { to: u32 },
    /// Nullable column becomes NOT NULL
    Nullability,
    /// Type change without lossless conversion
    Type { from: ColumnType, to: ColumnType },
}

impl fmt::Display for Narrowing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { to } => write!(f, "length narrowed to {}", to),
            Self::Nullability => write!(f, "nullable column becomes NOT NULL"),
            Self::Type { from, to } => write!(f, "type changes from {} to {}", from, to),
        }
    }
}

/// Named primary key constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// Action taken on referencing rows when the referenced row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cascade => write!(f, "CASCADE"),
            Self::SetNull => write!(f, "SET NULL"),
            Self::Restrict => write!(f, "RESTRICT"),
            Self::NoAction => write!(f, "NO ACTION"),
        }
    }
}

/// Named foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: ReferentialAction,
}

impl ForeignKey {
    /// Single-column foreign key to `referenced_table(Id)`
    pub fn to_id(
        name: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        on_delete: ReferentialAction,
    ) -> Self {
        Self {
            name: name.into(),
            columns: vec![column.into()],
            referenced_table: referenced_table.into(),
            referenced_columns: vec!["Id".to_string()],
            on_delete,
        }
    }
}

/// Named index, optionally unique and optionally partial
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    /// Filter predicate of a partial index, in SQL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Index {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            filter: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filter = Some(predicate.into());
        self
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(PrimaryKey {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn foreign_key(mut self, key: ForeignKey) -> Self {
        self.foreign_keys.push(key);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn find_index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn find_foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|k| k.name == name)
    }

    /// Whether a key, foreign key or index of this table covers `column`
    pub fn constraint_using(&self, column: &str) -> Option<&str> {
        if let Some(pk) = &self.primary_key {
            if pk.columns.iter().any(|c| c == column) {
                return Some(&pk.name);
            }
        }
        self.foreign_keys
            .iter()
            .find(|k| k.columns.iter().any(|c| c == column))
            .map(|k| k.name.as_str())
            .or_else(|| {
                self.indexes
                    .iter()
                    .find(|i| i.columns.iter().any(|c| c == column))
                    .map(|i| i.name.as_str())
            })
    }

    /// Copy with columns, foreign keys and indexes sorted by name.
    ///
    /// Column position is not part of the structural contract: a dropped
    /// column that is re-added lands at the end of the table.
    pub fn normalized(&self) -> Self {
        let mut table = self.clone();
        table.columns.sort_by(|a, b| a.name.cmp(&b.name));
        table.foreign_keys.sort_by(|a, b| a.name.cmp(&b.name));
        table.indexes.sort_by(|a, b| a.name.cmp(&b.name));
        table
    }
}

/// Complete schema snapshot keyed by table name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: BTreeMap<String, Table>,
}

impl Schema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub(crate) fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub(crate) fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    /// Index names are unique across the schema (PostgreSQL semantics)
    pub fn find_index(&self, name: &str) -> Option<(&Table, &Index)> {
        self.tables
            .values()
            .find_map(|t| t.find_index(name).map(|i| (t, i)))
    }

    /// Foreign keys in other tables that reference `table`
    pub fn references_to<'a>(&'a self, table: &'a str) -> impl Iterator<Item = (&'a Table, &'a ForeignKey)> + 'a {
        self.tables.values().flat_map(move |t| {
            t.foreign_keys
                .iter()
                .filter(move |k| k.referenced_table == table && t.name != table)
                .map(move |k| (t, k))
        })
    }

    pub fn normalized(&self) -> Self {
        Self {
            tables: self
                .tables
                .iter()
                .map(|(name, table)| (name.clone(), table.normalized()))
                .collect(),
        }
    }

    /// Structural identity, ignoring column and constraint order
    pub fn structurally_eq(&self, other: &Schema) -> bool {
        self.normalized() == other.normalized()
    }
}

/// Sortable, timestamp-derived migration step identifier (`yyyyMMddHHmmss`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepId(pub u64);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:014}", self.0)
    }
}

impl FromStr for StepId {
    type Err = String;

    /// Accepts a bare id (`20250625100000`) or a full label
    /// (`20250625100000_AddPerroTable`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.split('_').next().unwrap_or_default();
        if digits.len() != 14 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("'{}' is not a 14-digit migration id", s));
        }
        digits
            .parse::<u64>()
            .map(StepId)
            .map_err(|e| format!("'{}' is not a migration id: {}", s, e))
    }
}

/// Applied step as reported by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedStep {
    pub id: StepId,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// Ledger position relative to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    /// Most recently applied step, `None` for an empty database
    pub current: Option<StepId>,
    pub applied: Vec<AppliedStep>,
    /// Labels of steps not yet applied, in apply order
    pub pending: Vec<String>,
}

/// Result of one apply or revert request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "step", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied(StepId),
    /// Reported no-op: the step was already in the ledger
    AlreadyApplied(StepId),
    Reverted(StepId),
    /// Reported no-op: the step was not in the ledger
    AlreadyReverted(StepId),
}

impl StepOutcome {
    pub fn step(&self) -> StepId {
        match *self {
            Self::Applied(id)
            | Self::AlreadyApplied(id)
            | Self::Reverted(id)
            | Self::AlreadyReverted(id) => id,
        }
    }

    /// Whether the database changed
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::AlreadyApplied(_) | Self::AlreadyReverted(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied(id) => write!(f, "applied {}", id),
            Self::AlreadyApplied(id) => write!(f, "{} already applied", id),
            Self::Reverted(id) => write!(f, "reverted {}", id),
            Self::AlreadyReverted(id) => write!(f, "{} already reverted", id),
        }
    }
}

/// Outcome of a command plus the version it left the database at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub outcomes: Vec<StepOutcome>,
    pub current: Option<StepId>,
}

impl RunReport {
    /// Number of steps that changed the database
    pub fn executed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_noop()).count()
    }
}
