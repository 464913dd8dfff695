use super::m20250520_120000_add_whatsapp_tables::{
    conversation_foreign_keys, message_conversation_fk, CONVERSATIONS, CONVERSATION_INDEXES,
    MESSAGES,
};
use super::m20250603_090000_add_green_api_whatsapp_config::green_api_configs;
use super::{created_at, id, varchar};
use crate::contract::model::{Column, ColumnType, PrimaryKey, Table};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

const CONVERSATION: &str = "WhatsAppConversation";

/// Renames the conversations table to its singular entity name, adds the
/// `Perros` demo table and retires the Green API config table.
///
/// Keys touching the renamed table are dropped and re-created under the new
/// name around the rename.
pub fn step() -> MigrationStep {
    let mut ops = vec![SchemaOp::drop_foreign_key(MESSAGES, message_conversation_fk(CONVERSATIONS))];
    ops.extend(
        conversation_foreign_keys(CONVERSATIONS)
            .into_iter()
            .map(|key| SchemaOp::drop_foreign_key(CONVERSATIONS, key)),
    );
    ops.push(SchemaOp::drop_primary_key(CONVERSATIONS, primary_key(CONVERSATIONS)));
    ops.push(SchemaOp::rename_table(CONVERSATIONS, CONVERSATION));
    ops.push(SchemaOp::add_primary_key(CONVERSATION, primary_key(CONVERSATION)));

    for suffix in CONVERSATION_INDEXES.into_iter().chain(["SessionId"]) {
        ops.push(SchemaOp::rename_index(
            CONVERSATION,
            format!("IX_{}_{}", CONVERSATIONS, suffix),
            format!("IX_{}_{}", CONVERSATION, suffix),
        ));
    }

    ops.extend(
        conversation_foreign_keys(CONVERSATION)
            .into_iter()
            .map(|key| SchemaOp::add_foreign_key(CONVERSATION, key)),
    );
    ops.push(SchemaOp::add_foreign_key(MESSAGES, message_conversation_fk(CONVERSATION)));

    ops.push(SchemaOp::create_table(perros()));
    ops.push(SchemaOp::drop_table(green_api_configs()));

    MigrationStep::new(20250625100000, "AddPerroTable", ops)
}

fn primary_key(table: &str) -> PrimaryKey {
    PrimaryKey {
        name: format!("PK_{}", table),
        columns: vec!["Id".to_string()],
    }
}

fn perros() -> Table {
    Table::new("Perros")
        .column(id())
        .column(varchar("Nombre", 100))
        .column(varchar("Raza", 100))
        .column(Column::required("Edad", ColumnType::Integer))
        .column(created_at())
        .primary_key("PK_Perros", ["Id"])
}
