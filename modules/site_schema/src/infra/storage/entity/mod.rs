//! SeaORM entities for the final site schema and the migration history
//!
//! Table and column names are the PascalCase identifiers the migrations
//! create; the Rust fields are snake_case.

pub mod companies;
pub mod contact_messages;
pub mod contact_notification_settings;
pub mod customers;
pub mod email_provider_settings;
pub mod enums;
pub mod history;
pub mod notifications;
pub mod pages;
pub mod perros;
pub mod published_snapshots;
pub mod users;
pub mod whatsapp_configs;
pub mod whatsapp_conversation;
pub mod whatsapp_messages;
