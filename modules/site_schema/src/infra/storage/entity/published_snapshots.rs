use sea_orm::entity::prelude::*;

/// Rendered content of a page at publish time.
///
/// Versions increase per page. A row is never rewritten; the only change
/// allowed after insert is setting `is_stale`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "PublishedSnapshots")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId")]
    pub company_id: i32,
    #[sea_orm(column_name = "PageId")]
    pub page_id: i32,
    #[sea_orm(column_name = "Version")]
    pub version: i32,
    #[sea_orm(column_name = "Content")]
    pub content: Json,
    #[sea_orm(column_name = "IsStale")]
    pub is_stale: bool,
    #[sea_orm(column_name = "PublishedAt")]
    pub published_at: DateTimeUtc,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pages::Entity",
        from = "Column::PageId",
        to = "super::pages::Column::Id",
        on_delete = "Cascade"
    )]
    Page,
}

impl Related<super::pages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Page.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
