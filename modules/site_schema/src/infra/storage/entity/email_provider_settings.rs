use super::enums::EmailProvider;
use sea_orm::entity::prelude::*;

/// Outgoing email configuration, one row per company.
///
/// Each secret is stored next to its display mask.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "EmailProviderSettings")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId", unique)]
    pub company_id: i32,
    #[sea_orm(column_name = "Provider")]
    pub provider: EmailProvider,
    #[sea_orm(column_name = "SmtpHost")]
    pub smtp_host: Option<String>,
    #[sea_orm(column_name = "SmtpPort")]
    pub smtp_port: Option<i32>,
    #[sea_orm(column_name = "SmtpUsername")]
    pub smtp_username: Option<String>,
    #[sea_orm(column_name = "SmtpPassword")]
    pub smtp_password: Option<String>,
    #[sea_orm(column_name = "SmtpPasswordMask")]
    pub smtp_password_mask: Option<String>,
    #[sea_orm(column_name = "ApiKey")]
    pub api_key: Option<String>,
    #[sea_orm(column_name = "ApiKeyMask")]
    pub api_key_mask: Option<String>,
    #[sea_orm(column_name = "FromEmail")]
    pub from_email: String,
    #[sea_orm(column_name = "FromName")]
    pub from_name: Option<String>,
    #[sea_orm(column_name = "UseSsl")]
    pub use_ssl: bool,
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
