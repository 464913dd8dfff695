use sea_orm::entity::prelude::*;

/// Demo table; not tenant-scoped
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "Perros")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "Nombre")]
    pub nombre: String,
    #[sea_orm(column_name = "Raza")]
    pub raza: String,
    #[sea_orm(column_name = "Edad")]
    pub edad: i32,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
