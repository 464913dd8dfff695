//! Migration history of the site schema
//!
//! One module per step, applied in id order. Only forward operations are
//! written here; the backward list of each step is derived.

use crate::contract::model::{Column, ColumnType, ForeignKey, Literal, ReferentialAction, Table};
use crate::contract::MigrationError;
use crate::domain::step::{Catalog, MigrationStep};

mod m20250310_093000_initial_create;
mod m20250402_141500_add_contact_messages;
mod m20250418_110000_add_notifications_and_email_provider_settings;
mod m20250505_160000_add_published_snapshots;
mod m20250520_120000_add_whatsapp_tables;
mod m20250603_090000_add_green_api_whatsapp_config;
mod m20250612_150000_widen_whatsapp_message_addresses;
mod m20250618_113000_add_whatsapp_webhook_auth;
mod m20250625_100000_add_perro_table;
mod m20250702_094500_add_soft_delete_to_whatsapp_messages;
mod m20250715_170000_adjust_contact_message_lengths;

/// Tenant root table
pub const TENANT_TABLE: &str = "Companies";

/// All steps in apply order
pub fn steps() -> Vec<MigrationStep> {
    vec![
        m20250310_093000_initial_create::step(),
        m20250402_141500_add_contact_messages::step(),
        m20250418_110000_add_notifications_and_email_provider_settings::step(),
        m20250505_160000_add_published_snapshots::step(),
        m20250520_120000_add_whatsapp_tables::step(),
        m20250603_090000_add_green_api_whatsapp_config::step(),
        m20250612_150000_widen_whatsapp_message_addresses::step(),
        m20250618_113000_add_whatsapp_webhook_auth::step(),
        m20250625_100000_add_perro_table::step(),
        m20250702_094500_add_soft_delete_to_whatsapp_messages::step(),
        m20250715_170000_adjust_contact_message_lengths::step(),
    ]
}

/// Validated catalog of the site schema
pub fn catalog() -> Result<Catalog, MigrationError> {
    Catalog::new(steps())
}

// Column and key helpers shared by the steps

fn id() -> Column {
    Column::required("Id", ColumnType::Integer).identity()
}

fn company_id() -> Column {
    Column::required("CompanyId", ColumnType::Integer)
}

fn created_at() -> Column {
    Column::required("CreatedAt", ColumnType::Timestamp)
}

fn updated_at() -> Column {
    Column::required("UpdatedAt", ColumnType::Timestamp)
}

fn flag(name: &str, default: bool) -> Column {
    Column::required(name, ColumnType::Boolean).with_default(Literal::Bool(default))
}

fn varchar(name: &str, length: u32) -> Column {
    Column::required(name, ColumnType::Varchar(length))
}

fn optional_varchar(name: &str, length: u32) -> Column {
    Column::optional(name, ColumnType::Varchar(length))
}

fn varchar_default(name: &str, length: u32, default: &str) -> Column {
    varchar(name, length).with_default(Literal::Str(default.to_string()))
}

/// `FK_{table}_{referenced}_{column}` to `referenced(Id)`
fn fk(table: &str, column: &str, referenced: &str, on_delete: ReferentialAction) -> ForeignKey {
    ForeignKey::to_id(
        format!("FK_{}_{}_{}", table, referenced, column),
        column,
        referenced,
        on_delete,
    )
}

fn company_fk(table: &str) -> ForeignKey {
    fk(table, "CompanyId", TENANT_TABLE, ReferentialAction::Cascade)
}

/// `Id` identity primary key, non-null `CompanyId` with a cascading key to
/// the tenant root. Callers add the index on `CompanyId`.
fn tenant_table(name: &str) -> Table {
    Table::new(name)
        .column(id())
        .column(company_id())
        .primary_key(format!("PK_{}", name), ["Id"])
        .foreign_key(company_fk(name))
}
