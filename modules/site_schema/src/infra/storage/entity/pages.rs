use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "Pages")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId")]
    pub company_id: i32,
    #[sea_orm(column_name = "Title")]
    pub title: String,
    #[sea_orm(column_name = "Slug")]
    pub slug: String,
    #[sea_orm(column_name = "Content")]
    pub content: Option<Json>,
    #[sea_orm(column_name = "IsPublished")]
    pub is_published: bool,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "UpdatedAt")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::published_snapshots::Entity")]
    PublishedSnapshots,
}

impl Related<super::published_snapshots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PublishedSnapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
