use super::{
    created_at, flag, optional_varchar, tenant_table, updated_at, varchar, varchar_default,
};
use crate::contract::model::{Column, ColumnType, Index, Literal, Table};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250603090000,
        "AddGreenApiWhatsAppConfig",
        vec![SchemaOp::create_table(green_api_configs())],
    )
}

/// Green API instance settings, superseded by `WhatsAppConfigs` and dropped
/// again by `AddPerroTable`
pub(super) fn green_api_configs() -> Table {
    tenant_table("GreenApiWhatsAppConfigs")
        .column(varchar("InstanceId", 50))
        .column(Column::required("ApiTokenInstance", ColumnType::Text))
        .column(varchar("ApiTokenMask", 32))
        .column(varchar_default("ApiUrl", 255, "https://api.green-api.com"))
        .column(optional_varchar("MediaUrl", 255))
        .column(varchar("PhoneNumber", 20))
        .column(optional_varchar("WebhookUrl", 500))
        .column(optional_varchar("WebhookToken", 255))
        .column(varchar_default("InstanceState", 30, "notAuthorized"))
        .column(flag("IsActive", true))
        .column(
            Column::required("DelaySendMessagesMilliseconds", ColumnType::Integer)
                .with_default(Literal::Int(1000)),
        )
        .column(flag("IncomingWebhook", true))
        .column(flag("OutgoingWebhook", true))
        .column(Column::optional("LastStateCheckAt", ColumnType::Timestamp))
        .column(created_at())
        .column(updated_at())
        .index(Index::new("IX_GreenApiWhatsAppConfigs_CompanyId", ["CompanyId"]).unique())
        .index(Index::new("IX_GreenApiWhatsAppConfigs_InstanceId", ["InstanceId"]).unique())
        .index(Index::new("IX_GreenApiWhatsAppConfigs_PhoneNumber", ["PhoneNumber"]))
        .index(
            Index::new("IX_GreenApiWhatsAppConfigs_IsActive", ["IsActive"])
                .filter("\"IsActive\" = true"),
        )
}
