//! Migration history table

use sea_orm::entity::prelude::*;

/// One row per applied migration step
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "schema_history")]
pub struct Model {
    /// Step id (`yyyyMMddHHmmss`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    /// Step name
    pub name: String,

    /// SHA-256 of the step's forward operations, hex encoded
    pub checksum: String,

    pub applied_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
