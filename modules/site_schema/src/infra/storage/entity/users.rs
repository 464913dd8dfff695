use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "Users")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId")]
    pub company_id: i32,
    #[sea_orm(column_name = "Email")]
    pub email: String,
    #[sea_orm(column_name = "FullName")]
    pub full_name: String,
    #[sea_orm(column_name = "PasswordHash")]
    pub password_hash: String,
    #[sea_orm(column_name = "Role")]
    pub role: String,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "UpdatedAt")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
