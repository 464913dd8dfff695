//! Storage layer - DDL rendering, entities and repositories

pub mod ddl;
pub mod entity;
pub mod mapper;
pub mod memory;
pub mod migrations;
pub mod repositories;

pub use memory::InMemorySchemaRepository;
pub use repositories::{SeaOrmSchemaRepository, SiteDataRepository};
