use super::m20250520_120000_add_whatsapp_tables::MESSAGES;
use super::{created_at, fk, flag};
use crate::contract::model::{Column, ColumnType, Index, ReferentialAction};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

/// Deleted messages keep their row and their conversation link
pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250702094500,
        "AddSoftDeleteToWhatsAppMessages",
        vec![
            SchemaOp::add_column(MESSAGES, flag("IsDeleted", false)),
            SchemaOp::add_column(MESSAGES, Column::optional("DeletedAt", ColumnType::Timestamp)),
            SchemaOp::add_column(
                MESSAGES,
                Column::optional("DeletedByUserId", ColumnType::Integer),
            ),
            SchemaOp::create_index(
                MESSAGES,
                Index::new("IX_WhatsAppMessages_DeletedByUserId", ["DeletedByUserId"]),
            ),
            SchemaOp::add_foreign_key(
                MESSAGES,
                fk(MESSAGES, "DeletedByUserId", "Users", ReferentialAction::SetNull),
            ),
            SchemaOp::create_index(
                MESSAGES,
                Index::new(
                    "IX_WhatsAppMessages_ConversationId_CreatedAt_Visible",
                    ["ConversationId", "CreatedAt"],
                )
                .filter("\"IsDeleted\" = false"),
            ),
            SchemaOp::alter_column(
                MESSAGES,
                created_at(),
                created_at().with_sql_default("CURRENT_TIMESTAMP"),
            ),
        ],
    )
}
