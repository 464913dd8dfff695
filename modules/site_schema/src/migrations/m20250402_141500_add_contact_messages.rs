use super::{
    created_at, flag, optional_varchar, tenant_table, updated_at, varchar, varchar_default,
};
use crate::contract::model::{Column, ColumnType, Index, Table};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

pub(super) const TOAST_TEMPLATE: &str = "Nuevo mensaje de {Name}: {Subject}";

pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250402141500,
        "AddContactMessages",
        vec![
            SchemaOp::create_table(contact_messages()),
            SchemaOp::create_table(contact_notification_settings()),
        ],
    )
}

fn contact_messages() -> Table {
    tenant_table("ContactMessages")
        .column(varchar("Name", 100))
        .column(varchar("Email", 256))
        .column(optional_varchar("Phone", 20))
        .column(optional_varchar("Subject", 200))
        .column(Column::required("Message", ColumnType::Text))
        .column(flag("IsRead", false))
        .column(created_at())
        .index(Index::new(
            "IX_ContactMessages_CompanyId_CreatedAt",
            ["CompanyId", "CreatedAt"],
        ))
}

fn contact_notification_settings() -> Table {
    tenant_table("ContactNotificationSettings")
        .column(flag("EmailNotificationsEnabled", true))
        .column(optional_varchar("NotificationEmail", 256))
        .column(flag("ToastNotificationsEnabled", true))
        .column(varchar_default("ToastMessageTemplate", 1000, TOAST_TEMPLATE))
        .column(varchar_default(
            "EmailSubjectTemplate",
            200,
            "Nuevo mensaje de contacto: {Subject}",
        ))
        .column(Column::optional("EmailBodyTemplate", ColumnType::Text))
        .column(created_at())
        .column(updated_at())
        .index(Index::new("IX_ContactNotificationSettings_CompanyId", ["CompanyId"]).unique())
}
