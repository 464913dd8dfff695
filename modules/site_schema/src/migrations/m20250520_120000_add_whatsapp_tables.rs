use super::{
    created_at, fk, flag, optional_varchar, tenant_table, updated_at, varchar, varchar_default,
};
use crate::contract::model::{Column, ColumnType, ForeignKey, Index, Literal, ReferentialAction, Table};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

pub(super) const CONVERSATIONS: &str = "WhatsAppConversations";
pub(super) const MESSAGES: &str = "WhatsAppMessages";

pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250520120000,
        "AddWhatsAppTables",
        vec![
            SchemaOp::create_table(conversations()),
            SchemaOp::create_table(messages()),
            SchemaOp::create_table(configs()),
        ],
    )
}

/// Foreign keys owned by the conversations table, by referenced table
pub(super) fn conversation_foreign_keys(table: &str) -> Vec<ForeignKey> {
    vec![
        fk(table, "CompanyId", super::TENANT_TABLE, ReferentialAction::Cascade),
        fk(table, "CustomerId", "Customers", ReferentialAction::SetNull),
        fk(table, "AssignedUserId", "Users", ReferentialAction::SetNull),
    ]
}

pub(super) fn message_conversation_fk(conversations: &str) -> ForeignKey {
    fk(MESSAGES, "ConversationId", conversations, ReferentialAction::Cascade)
}

/// Conversation index suffixes, `IX_{table}_{suffix}`
pub(super) const CONVERSATION_INDEXES: [&str; 4] = [
    "CompanyId_CustomerPhone_BusinessPhone",
    "CustomerId",
    "AssignedUserId",
    "LastMessageAt",
];

fn conversations() -> Table {
    let mut table = Table::new(CONVERSATIONS)
        .column(super::id())
        .column(super::company_id())
        .column(varchar("CustomerPhone", 20))
        .column(varchar("BusinessPhone", 20))
        .column(varchar_default("Status", 20, "active"))
        .column(varchar_default("Priority", 20, "normal"))
        .column(Column::required("UnreadCount", ColumnType::Integer).with_default(Literal::Int(0)))
        .column(Column::optional("LastMessageAt", ColumnType::Timestamp))
        .column(Column::optional("CustomerId", ColumnType::Integer))
        .column(Column::optional("AssignedUserId", ColumnType::Integer))
        .column(created_at())
        .column(updated_at())
        .primary_key(format!("PK_{}", CONVERSATIONS), ["Id"])
        .index(
            Index::new(
                format!("IX_{}_{}", CONVERSATIONS, CONVERSATION_INDEXES[0]),
                ["CompanyId", "CustomerPhone", "BusinessPhone"],
            )
            .unique(),
        )
        .index(Index::new(format!("IX_{}_{}", CONVERSATIONS, CONVERSATION_INDEXES[1]), ["CustomerId"]))
        .index(Index::new(
            format!("IX_{}_{}", CONVERSATIONS, CONVERSATION_INDEXES[2]),
            ["AssignedUserId"],
        ))
        .index(Index::new(
            format!("IX_{}_{}", CONVERSATIONS, CONVERSATION_INDEXES[3]),
            ["LastMessageAt"],
        ));
    table.foreign_keys = conversation_foreign_keys(CONVERSATIONS);
    table
}

fn messages() -> Table {
    tenant_table(MESSAGES)
        .column(Column::required("ConversationId", ColumnType::Integer))
        .column(varchar("Direction", 10))
        .column(varchar_default("Status", 20, "queued"))
        .column(varchar_default("MessageType", 20, "text"))
        .column(varchar("FromAddress", 20))
        .column(varchar("ToAddress", 20))
        .column(Column::optional("Body", ColumnType::Text))
        .column(optional_varchar("MediaUrl", 2048))
        .column(optional_varchar("ProviderMessageId", 128))
        .column(created_at())
        .column(updated_at())
        .column(Column::optional("SentAt", ColumnType::Timestamp))
        .column(Column::optional("ReadAt", ColumnType::Timestamp))
        .foreign_key(message_conversation_fk(CONVERSATIONS))
        .index(Index::new("IX_WhatsAppMessages_CompanyId", ["CompanyId"]))
        .index(Index::new(
            "IX_WhatsAppMessages_ConversationId_CreatedAt",
            ["ConversationId", "CreatedAt"],
        ))
        .index(
            Index::new("IX_WhatsAppMessages_ProviderMessageId", ["ProviderMessageId"])
                .unique()
                .filter("\"ProviderMessageId\" IS NOT NULL"),
        )
}

fn configs() -> Table {
    tenant_table("WhatsAppConfigs")
        .column(varchar_default("Provider", 20, "twilio"))
        .column(optional_varchar("AccountSid", 64))
        .column(Column::optional("AuthToken", ColumnType::Text))
        .column(optional_varchar("AuthTokenMask", 32))
        .column(optional_varchar("PhoneNumber", 20))
        .column(optional_varchar("WebhookUrl", 500))
        .column(flag("IsActive", true))
        .column(created_at())
        .column(updated_at())
        .index(Index::new("IX_WhatsAppConfigs_CompanyId", ["CompanyId"]).unique())
}
