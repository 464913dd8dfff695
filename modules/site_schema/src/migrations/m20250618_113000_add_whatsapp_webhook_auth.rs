use super::optional_varchar;
use crate::contract::model::{Column, ColumnType};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

const CONFIGS: &str = "WhatsAppConfigs";

pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250618113000,
        "AddWhatsAppWebhookAuth",
        vec![
            SchemaOp::add_column(CONFIGS, optional_varchar("InstanceId", 50)),
            SchemaOp::add_column(CONFIGS, Column::optional("ApiToken", ColumnType::Text)),
            SchemaOp::add_column(CONFIGS, optional_varchar("ApiTokenMask", 32)),
            SchemaOp::add_column(CONFIGS, optional_varchar("WebhookAuthHeaderName", 100)),
            SchemaOp::add_column(CONFIGS, optional_varchar("WebhookAuthHeaderValueTemplate", 500)),
            SchemaOp::add_column(CONFIGS, Column::optional("WebhookSecret", ColumnType::Text)),
            SchemaOp::add_column(
                CONFIGS,
                Column::optional("LastWebhookEventAt", ColumnType::Timestamp),
            ),
        ],
    )
}
