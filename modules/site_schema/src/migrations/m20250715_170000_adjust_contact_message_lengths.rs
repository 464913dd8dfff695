use super::m20250402_141500_add_contact_messages::TOAST_TEMPLATE;
use super::{varchar, varchar_default};
use crate::domain::ops::{DataRule, SchemaOp};
use crate::domain::step::MigrationStep;

/// Narrows two contact columns. Existing values longer than the new limit
/// are truncated.
pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250715170000,
        "AdjustContactMessageLengths",
        vec![
            SchemaOp::alter_column("ContactMessages", varchar("Email", 256), varchar("Email", 200))
                .with_up_rule(DataRule::Truncate),
            SchemaOp::alter_column(
                "ContactNotificationSettings",
                varchar_default("ToastMessageTemplate", 1000, TOAST_TEMPLATE),
                varchar_default("ToastMessageTemplate", 500, TOAST_TEMPLATE),
            )
            .with_up_rule(DataRule::Truncate),
        ],
    )
}
