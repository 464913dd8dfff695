//! Site Schema
//!
//! Versioned multi-tenant relational schema for the site builder, expressed
//! as an ordered catalog of reversible migration steps, plus the ledger
//! engine that applies and reverts them.

// Public exports
pub mod contract;
pub use contract::{
    client::MigrationApi, error::MigrationError, MigrationStatus, RunReport, Schema, StepId,
    StepOutcome,
};

pub mod migrations;

pub mod config;
pub use config::Config;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
#[doc(hidden)]
pub mod logging;
