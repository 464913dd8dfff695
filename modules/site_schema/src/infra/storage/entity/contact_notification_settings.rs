use sea_orm::entity::prelude::*;

/// Notification configuration for contact messages, one row per company
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "ContactNotificationSettings")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId", unique)]
    pub company_id: i32,
    #[sea_orm(column_name = "EmailNotificationsEnabled")]
    pub email_notifications_enabled: bool,
    #[sea_orm(column_name = "NotificationEmail")]
    pub notification_email: Option<String>,
    #[sea_orm(column_name = "ToastNotificationsEnabled")]
    pub toast_notifications_enabled: bool,
    /// Placeholders in braces, e.g. `{Name}`; at most 500 characters
    #[sea_orm(column_name = "ToastMessageTemplate")]
    pub toast_message_template: String,
    #[sea_orm(column_name = "EmailSubjectTemplate")]
    pub email_subject_template: String,
    #[sea_orm(column_name = "EmailBodyTemplate")]
    pub email_body_template: Option<String>,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "UpdatedAt")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
