use super::enums::{MessageDirection, MessageStatus, MessageType};
use sea_orm::entity::prelude::*;

/// Message in a conversation.
///
/// Soft deleted rows keep their conversation link; readers filter on
/// `is_deleted`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "WhatsAppMessages")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "Id")]
    pub id: i32,
    #[sea_orm(column_name = "CompanyId")]
    pub company_id: i32,
    #[sea_orm(column_name = "ConversationId")]
    pub conversation_id: i32,
    #[sea_orm(column_name = "Direction")]
    pub direction: MessageDirection,
    #[sea_orm(column_name = "Status")]
    pub status: MessageStatus,
    #[sea_orm(column_name = "MessageType")]
    pub message_type: MessageType,
    /// Phone number or provider identifier
    #[sea_orm(column_name = "FromAddress")]
    pub from_address: String,
    #[sea_orm(column_name = "ToAddress")]
    pub to_address: String,
    #[sea_orm(column_name = "Body")]
    pub body: Option<String>,
    #[sea_orm(column_name = "MediaUrl")]
    pub media_url: Option<String>,
    /// Unique when present
    #[sea_orm(column_name = "ProviderMessageId")]
    pub provider_message_id: Option<String>,
    #[sea_orm(column_name = "CreatedAt")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "UpdatedAt")]
    pub updated_at: DateTimeUtc,
    #[sea_orm(column_name = "SentAt")]
    pub sent_at: Option<DateTimeUtc>,
    #[sea_orm(column_name = "ReadAt")]
    pub read_at: Option<DateTimeUtc>,
    #[sea_orm(column_name = "IsDeleted")]
    pub is_deleted: bool,
    #[sea_orm(column_name = "DeletedAt")]
    pub deleted_at: Option<DateTimeUtc>,
    #[sea_orm(column_name = "DeletedByUserId")]
    pub deleted_by_user_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::whatsapp_conversation::Entity",
        from = "Column::ConversationId",
        to = "super::whatsapp_conversation::Column::Id",
        on_delete = "Cascade"
    )]
    Conversation,
}

impl Related<super::whatsapp_conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
