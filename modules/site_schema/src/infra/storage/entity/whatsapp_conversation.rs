use super::enums::{ConversationPriority, ConversationStatus};
use sea_orm::entity::prelude::*;

/// Conversation thread, unique per (company, customer phone, business phone)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "WhatsAppConversation")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId")]
    pub company_id: i32,
    #[sea_orm(column_name = "CustomerPhone")]
    pub customer_phone: String,
    #[sea_orm(column_name = "BusinessPhone")]
    pub business_phone: String,
    #[sea_orm(column_name = "Status")]
    pub status: ConversationStatus,
    #[sea_orm(column_name = "Priority")]
    pub priority: ConversationPriority,
    #[sea_orm(column_name = "UnreadCount")]
    pub unread_count: i32,
    #[sea_orm(column_name = "LastMessageAt")]
    pub last_message_at: Option<DateTimeUtc>,
    /// Set to null when the customer is deleted
    #[sea_orm(column_name = "CustomerId")]
    pub customer_id: Option<i32>,
    /// Set to null when the user is deleted
    #[sea_orm(column_name = "AssignedUserId")]
    pub assigned_user_id: Option<i32>,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "UpdatedAt")]
    pub updated_at: DateTimeUtc,
    #[sea_orm(column_name = "SourceChannel")]
    pub source_channel: String,
    #[sea_orm(column_name = "SessionId")]
    pub session_id: Option<String>,
    #[sea_orm(column_name = "CustomerEmail")]
    pub customer_email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::whatsapp_messages::Entity")]
    Messages,
}

impl Related<super::whatsapp_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
