//! Contract layer - public schema model, error taxonomy and client trait
//!
//! Transport-agnostic: nothing here touches a database connection.

pub mod client;
pub mod error;
pub mod model;

pub use client::MigrationApi;
pub use error::{Location, MigrationError};
pub use model::{
    AppliedStep, Column, ColumnType, DefaultValue, ForeignKey, Index, Literal, MigrationStatus,
    Narrowing, PrimaryKey, ReferentialAction, RunReport, Schema, StepId, StepOutcome, Table,
};
