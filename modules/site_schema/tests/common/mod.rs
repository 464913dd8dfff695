//! Common test utilities: catalogs, services and a live SQLite site

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use site_schema::domain::{Catalog, NoOpEventPublisher, Service};
use site_schema::infra::storage::entity::{companies, customers, users};
use site_schema::infra::storage::{InMemorySchemaRepository, SeaOrmSchemaRepository};
use site_schema::migrations;
use std::sync::Arc;

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

pub fn catalog() -> Catalog {
    migrations::catalog().expect("catalog must be valid")
}

/// The first `count` steps of the real history
pub fn catalog_prefix(count: usize) -> Catalog {
    Catalog::new(migrations::steps().into_iter().take(count).collect())
        .expect("catalog prefix must be valid")
}

/// Single-step catalog that builds the final schema directly
pub fn baseline_catalog() -> Catalog {
    let baseline = catalog().baseline_step().expect("baseline must build");
    Catalog::new(vec![baseline]).expect("baseline catalog must be valid")
}

pub fn memory_service(catalog: Catalog) -> (Service, Arc<InMemorySchemaRepository>) {
    let repo = Arc::new(InMemorySchemaRepository::new());
    let service = Service::new(Arc::new(catalog), repo.clone(), Arc::new(NoOpEventPublisher));
    (service, repo)
}

/// Fresh in-memory SQLite database. One connection so every query sees the
/// same database.
pub async fn sqlite() -> Arc<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Arc::new(Database::connect(opts).await.expect("sqlite must connect"))
}

pub fn live_service(db: &Arc<DatabaseConnection>, catalog: Catalog) -> Service {
    Service::new(
        Arc::new(catalog),
        Arc::new(SeaOrmSchemaRepository::new(db.clone())),
        Arc::new(NoOpEventPublisher),
    )
}

/// SQLite database at the final schema
pub async fn live_site() -> Arc<DatabaseConnection> {
    let db = sqlite().await;
    live_service(&db, baseline_catalog())
        .up()
        .await
        .expect("baseline must apply on sqlite");
    db
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, day, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub async fn seed_company(db: &DatabaseConnection, subdomain: &str) -> companies::Model {
    companies::ActiveModel {
        name: Set(format!("Company {}", subdomain)),
        subdomain: Set(subdomain.to_string()),
        custom_domain: Set(None),
        is_active: Set(true),
        created_at: Set(at(1)),
        updated_at: Set(at(1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("company insert")
}

pub async fn seed_user(db: &DatabaseConnection, company_id: i32, email: &str) -> users::Model {
    users::ActiveModel {
        company_id: Set(company_id),
        email: Set(email.to_string()),
        full_name: Set("Ana Torres".to_string()),
        password_hash: Set("hash".to_string()),
        role: Set("editor".to_string()),
        created_at: Set(at(1)),
        updated_at: Set(at(1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("user insert")
}

pub async fn seed_customer(db: &DatabaseConnection, company_id: i32, phone: &str) -> customers::Model {
    customers::ActiveModel {
        company_id: Set(company_id),
        name: Set("Luis Pérez".to_string()),
        email: Set(None),
        phone: Set(Some(phone.to_string())),
        created_at: Set(at(2)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("customer insert")
}
