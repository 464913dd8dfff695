use super::{created_at, fk, flag, tenant_table};
use crate::contract::model::{Column, ColumnType, Index, ReferentialAction, Table};
use crate::domain::ops::SchemaOp;
use crate::domain::step::MigrationStep;

pub fn step() -> MigrationStep {
    MigrationStep::new(
        20250505160000,
        "AddPublishedSnapshots",
        vec![SchemaOp::create_table(published_snapshots())],
    )
}

/// Rows are written once per publish and only ever marked stale
fn published_snapshots() -> Table {
    tenant_table("PublishedSnapshots")
        .column(Column::required("PageId", ColumnType::Integer))
        .column(Column::required("Version", ColumnType::Integer))
        .column(Column::required("Content", ColumnType::Json))
        .column(flag("IsStale", false))
        .column(Column::required("PublishedAt", ColumnType::Timestamp))
        .column(created_at())
        .foreign_key(fk("PublishedSnapshots", "PageId", "Pages", ReferentialAction::Cascade))
        .index(Index::new("IX_PublishedSnapshots_PageId_Version", ["PageId", "Version"]).unique())
        .index(Index::new("IX_PublishedSnapshots_CompanyId_PageId", ["CompanyId", "PageId"]))
}
