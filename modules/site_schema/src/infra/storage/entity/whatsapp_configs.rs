use super::enums::WhatsAppProvider;
use sea_orm::entity::prelude::*;

/// WhatsApp provider configuration, one row per company
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "WhatsAppConfigs")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId", unique)]
    pub company_id: i32,
    #[sea_orm(column_name = "Provider")]
    pub provider: WhatsAppProvider,
    #[sea_orm(column_name = "AccountSid")]
    pub account_sid: Option<String>,
    #[sea_orm(column_name = "AuthToken")]
    pub auth_token: Option<String>,
    #[sea_orm(column_name = "AuthTokenMask")]
    pub auth_token_mask: Option<String>,
    #[sea_orm(column_name = "PhoneNumber")]
    pub phone_number: Option<String>,
    #[sea_orm(column_name = "WebhookUrl")]
    pub webhook_url: Option<String>,
    #[sea_orm(column_name = "IsActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "UpdatedAt")]
    pub updated_at: DateTimeUtc,
    /// Green API instance, when `provider` is `greenapi`
    #[sea_orm(column_name = "InstanceId")]
    pub instance_id: Option<String>,
    #[sea_orm(column_name = "ApiToken")]
    pub api_token: Option<String>,
    #[sea_orm(column_name = "ApiTokenMask")]
    pub api_token_mask: Option<String>,
    /// Header the provider must send on webhook calls
    #[sea_orm(column_name = "WebhookAuthHeaderName")]
    pub webhook_auth_header_name: Option<String>,
    #[sea_orm(column_name = "WebhookAuthHeaderValueTemplate")]
    pub webhook_auth_header_value_template: Option<String>,
    #[sea_orm(column_name = "WebhookSecret")]
    pub webhook_secret: Option<String>,
    #[sea_orm(column_name = "LastWebhookEventAt")]
    pub last_webhook_event_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
