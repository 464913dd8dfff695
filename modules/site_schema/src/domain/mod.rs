//! Domain layer - schema operations, ledger and migration service

pub mod credentials;
pub mod diff;
pub mod events;
pub mod ledger;
pub mod ops;
pub mod repository;
pub mod service;
pub mod step;
pub mod tenancy;
pub mod validation;
pub mod verify;

pub use events::{EventPublisher, MigrationEvent, NoOpEventPublisher, TracingEventPublisher};
pub use ledger::{Ledger, LedgerEntry, StepPlan};
pub use ops::{apply_all, DataRule, SchemaOp};
pub use repository::SchemaRepository;
pub use service::Service;
pub use step::{Catalog, Direction, MigrationStep};
pub use tenancy::{TenancyPolicy, TenancyRule, TenancyViolation};
pub use verify::{verify_catalog, verify_step, VerificationReport};
