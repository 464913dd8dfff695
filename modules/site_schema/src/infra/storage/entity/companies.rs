use sea_orm::entity::prelude::*;

/// Tenant root. Deleting a company cascades to every tenant-scoped row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "Companies")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "Name")]
    pub name: String,
    #[sea_orm(column_name = "Subdomain", unique)]
    pub subdomain: String,
    #[sea_orm(column_name = "CustomDomain")]
    pub custom_domain: Option<String>,
    #[sea_orm(column_name = "IsActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "UpdatedAt")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
