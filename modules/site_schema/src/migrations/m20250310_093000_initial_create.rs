use super::{
    created_at, flag, id, optional_varchar, tenant_table, varchar_default, updated_at, varchar,
    TENANT_TABLE,
};
use crate::contract::model::{Column, ColumnType, Index, Table};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250310093000,
        "InitialCreate",
        vec![
            SchemaOp::create_table(companies()),
            SchemaOp::create_table(users()),
            SchemaOp::create_table(customers()),
            SchemaOp::create_table(pages()),
        ],
    )
}

fn companies() -> Table {
    Table::new(TENANT_TABLE)
        .column(id())
        .column(varchar("Name", 200))
        .column(varchar("Subdomain", 100))
        .column(optional_varchar("CustomDomain", 255))
        .column(flag("IsActive", true))
        .column(created_at())
        .column(updated_at())
        .primary_key("PK_Companies", ["Id"])
        .index(Index::new("IX_Companies_Subdomain", ["Subdomain"]).unique())
}

fn users() -> Table {
    tenant_table("Users")
        .column(varchar("Email", 256))
        .column(varchar("FullName", 200))
        .column(Column::required("PasswordHash", ColumnType::Text))
        .column(varchar_default("Role", 20, "editor"))
        .column(created_at())
        .column(updated_at())
        .index(Index::new("IX_Users_CompanyId_Email", ["CompanyId", "Email"]).unique())
}

fn customers() -> Table {
    tenant_table("Customers")
        .column(varchar("Name", 200))
        .column(optional_varchar("Email", 256))
        .column(optional_varchar("Phone", 20))
        .column(created_at())
        .index(Index::new("IX_Customers_CompanyId_Phone", ["CompanyId", "Phone"]))
}

fn pages() -> Table {
    tenant_table("Pages")
        .column(varchar("Title", 200))
        .column(varchar("Slug", 200))
        .column(Column::optional("Content", ColumnType::Json))
        .column(flag("IsPublished", false))
        .column(created_at())
        .column(updated_at())
        .index(Index::new("IX_Pages_CompanyId_Slug", ["CompanyId", "Slug"]).unique())
}
