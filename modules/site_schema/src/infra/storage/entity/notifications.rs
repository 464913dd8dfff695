use sea_orm::entity::prelude::*;

/// Read/unread notification feed entry.
///
/// `related_entity_type`/`related_entity_id` point at any other row by
/// name and id; there is no foreign key behind them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "Notifications")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId")]
    pub company_id: i32,
    #[sea_orm(column_name = "UserId")]
    pub user_id: Option<i32>,
    #[sea_orm(column_name = "Type")]
    pub r#type: String,
    #[sea_orm(column_name = "Title")]
    pub title: String,
    #[sea_orm(column_name = "Message")]
    pub message: String,
    #[sea_orm(column_name = "RelatedEntityType")]
    pub related_entity_type: Option<String>,
    #[sea_orm(column_name = "RelatedEntityId")]
    pub related_entity_id: Option<String>,
    #[sea_orm(column_name = "IsRead")]
    pub is_read: bool,
    #[sea_orm(column_name = "ReadAt")]
    pub read_at: Option<DateTimeUtc>,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
