use super::m20250520_120000_add_whatsapp_tables::{CONVERSATIONS, MESSAGES};
use super::{optional_varchar, varchar, varchar_default};
use crate::contract::model::Index;
use crate::domain::ops::{DataRule, SchemaOp};
use crate::domain::step::MigrationStep;

/// Addresses may be provider identifiers such as `123456789@c.us`, not only
/// E.164 phone numbers
pub fn step() -> MigrationStep {
    let mut ops: Vec<SchemaOp> = ["FromAddress", "ToAddress"]
        .into_iter()
        .map(|name| {
            SchemaOp::alter_column(MESSAGES, varchar(name, 20), varchar(name, 255))
                .with_down_rule(DataRule::Truncate)
        })
        .collect();

    ops.extend([
        SchemaOp::add_column(CONVERSATIONS, varchar_default("SourceChannel", 20, "whatsapp")),
        SchemaOp::add_column(CONVERSATIONS, optional_varchar("SessionId", 100)),
        SchemaOp::add_column(CONVERSATIONS, optional_varchar("CustomerEmail", 256)),
        SchemaOp::create_index(
            CONVERSATIONS,
            Index::new(format!("IX_{}_SessionId", CONVERSATIONS), ["SessionId"]),
        ),
    ]);

    MigrationStep::new(20250612150000, "WidenWhatsAppMessageAddresses", ops)
}
