use sea_orm::entity::prelude::*;

/// Contact form submission
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "ContactMessages")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId")]
    pub company_id: i32,
    #[sea_orm(column_name = "Name")]
    pub name: String,
    /// At most 200 characters
    #[sea_orm(column_name = "Email")]
    pub email: String,
    #[sea_orm(column_name = "Phone")]
    pub phone: Option<String>,
    #[sea_orm(column_name = "Subject")]
    pub subject: Option<String>,
    #[sea_orm(column_name = "Message")]
    pub message: String,
    #[sea_orm(column_name = "IsRead")]
    pub is_read: bool,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
