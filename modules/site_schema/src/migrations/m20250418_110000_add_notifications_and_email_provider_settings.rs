use super::{
    created_at, fk, flag, optional_varchar, tenant_table, updated_at, varchar, varchar_default,
};
use crate::contract::model::{Column, ColumnType, Index, ReferentialAction, Table};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250418110000,
        "AddNotificationsAndEmailProviderSettings",
        vec![
            SchemaOp::create_table(notifications()),
            SchemaOp::create_table(email_provider_settings()),
        ],
    )
}

/// Related entities are referenced by a type/id string pair, not a key
fn notifications() -> Table {
    tenant_table("Notifications")
        .column(Column::optional("UserId", ColumnType::Integer))
        .column(varchar("Type", 50))
        .column(varchar("Title", 200))
        .column(Column::required("Message", ColumnType::Text))
        .column(optional_varchar("RelatedEntityType", 50))
        .column(optional_varchar("RelatedEntityId", 64))
        .column(flag("IsRead", false))
        .column(Column::optional("ReadAt", ColumnType::Timestamp))
        .column(created_at())
        .foreign_key(fk("Notifications", "UserId", "Users", ReferentialAction::SetNull))
        .index(Index::new("IX_Notifications_CompanyId_IsRead", ["CompanyId", "IsRead"]))
        .index(Index::new("IX_Notifications_UserId", ["UserId"]))
        .index(Index::new(
            "IX_Notifications_RelatedEntityType_RelatedEntityId",
            ["RelatedEntityType", "RelatedEntityId"],
        ))
}

fn email_provider_settings() -> Table {
    tenant_table("EmailProviderSettings")
        .column(varchar_default("Provider", 20, "smtp"))
        .column(optional_varchar("SmtpHost", 255))
        .column(Column::optional("SmtpPort", ColumnType::Integer))
        .column(optional_varchar("SmtpUsername", 255))
        .column(Column::optional("SmtpPassword", ColumnType::Text))
        .column(optional_varchar("SmtpPasswordMask", 32))
        .column(Column::optional("ApiKey", ColumnType::Text))
        .column(optional_varchar("ApiKeyMask", 32))
        .column(varchar("FromEmail", 256))
        .column(optional_varchar("FromName", 200))
        .column(flag("UseSsl", true))
        .column(flag("IsActive", true))
        .column(created_at())
        .column(updated_at())
        .index(Index::new("IX_EmailProviderSettings_CompanyId", ["CompanyId"]).unique())
}
