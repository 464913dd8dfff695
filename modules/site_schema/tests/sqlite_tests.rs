//! Live tests on in-memory SQLite through sea-orm

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, Set, Statement,
};
use sea_orm_migration::MigratorTrait;
use site_schema::contract::{MigrationError, Schema, StepId};
use site_schema::infra::storage::entity::enums::{
    ConversationPriority, ConversationStatus, EmailProvider, MessageDirection, MessageStatus,
    MessageType, WhatsAppProvider,
};
use site_schema::infra::storage::entity::{
    companies, contact_messages, contact_notification_settings, customers, email_provider_settings,
    history, notifications, pages, perros, published_snapshots, users, whatsapp_configs,
    whatsapp_conversation, whatsapp_messages,
};
use site_schema::infra::storage::migrations::Migrator;
use site_schema::infra::storage::SiteDataRepository;

mod common;
use common::{
    at, baseline_catalog, catalog, catalog_prefix, live_service, live_site, print_test_header,
    seed_company, seed_customer, seed_user, sqlite,
};

const WIDEN_ADDRESSES: StepId = StepId(20250612150000);

async fn table_names(db: &DatabaseConnection) -> Vec<String> {
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        ))
        .await
        .expect("list tables");
    rows.iter()
        .map(|row| row.try_get::<String>("", "name").expect("name column"))
        .collect()
}

/// Shape of one table as both the model and `PRAGMA` introspection see it
#[derive(Debug, PartialEq, Eq)]
struct TableShape {
    name: String,
    /// Column name and nullability, in declaration order
    columns: Vec<(String, bool)>,
    primary_key: Vec<String>,
    foreign_keys: Vec<KeyShape>,
    indexes: Vec<IndexShape>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct KeyShape {
    columns: Vec<String>,
    referenced_table: String,
    referenced_columns: Vec<String>,
    on_delete: String,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct IndexShape {
    name: String,
    columns: Vec<String>,
    unique: bool,
    partial: bool,
}

fn model_shape(schema: &Schema) -> Vec<TableShape> {
    let mut tables: Vec<TableShape> = schema
        .tables()
        .map(|table| {
            let mut foreign_keys: Vec<KeyShape> = table
                .foreign_keys
                .iter()
                .map(|key| KeyShape {
                    columns: key.columns.clone(),
                    referenced_table: key.referenced_table.clone(),
                    referenced_columns: key.referenced_columns.clone(),
                    on_delete: key.on_delete.to_string(),
                })
                .collect();
            foreign_keys.sort();
            let mut indexes: Vec<IndexShape> = table
                .indexes
                .iter()
                .map(|index| IndexShape {
                    name: index.name.clone(),
                    columns: index.columns.clone(),
                    unique: index.unique,
                    partial: index.filter.is_some(),
                })
                .collect();
            indexes.sort();
            TableShape {
                name: table.name.clone(),
                columns: table.columns.iter().map(|c| (c.name.clone(), c.nullable)).collect(),
                primary_key: table
                    .primary_key
                    .as_ref()
                    .map(|pk| pk.columns.clone())
                    .unwrap_or_default(),
                foreign_keys,
                indexes,
            }
        })
        .collect();
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    tables
}

async fn pragma(db: &DatabaseConnection, sql: String) -> Vec<sea_orm::QueryResult> {
    db.query_all(Statement::from_string(DbBackend::Sqlite, sql.clone()))
        .await
        .unwrap_or_else(|e| panic!("{}: {}", sql, e))
}

fn text(row: &sea_orm::QueryResult, column: &str) -> String {
    row.try_get::<String>("", column)
        .unwrap_or_else(|e| panic!("{}: {}", column, e))
}

fn number(row: &sea_orm::QueryResult, column: &str) -> i64 {
    row.try_get::<i64>("", column)
        .unwrap_or_else(|e| panic!("{}: {}", column, e))
}

/// Read every site table back from SQLite, leaving out ledger tables
async fn live_shape(db: &DatabaseConnection) -> Vec<TableShape> {
    let mut tables = Vec::new();
    for name in table_names(db).await {
        if name == "schema_history" || name == "seaql_migrations" {
            continue;
        }

        let info = pragma(db, format!("PRAGMA table_info(\"{}\")", name)).await;
        let columns = info
            .iter()
            .map(|row| (text(row, "name"), number(row, "notnull") == 0))
            .collect();
        let mut key_columns: Vec<(i64, String)> = info
            .iter()
            .filter(|row| number(row, "pk") > 0)
            .map(|row| (number(row, "pk"), text(row, "name")))
            .collect();
        key_columns.sort();

        // One row per column; rows of a composite key share an id
        let mut foreign_keys: Vec<(i64, KeyShape)> = Vec::new();
        for row in pragma(db, format!("PRAGMA foreign_key_list(\"{}\")", name)).await {
            let id = number(&row, "id");
            match foreign_keys.iter_mut().find(|(existing, _)| *existing == id) {
                Some((_, key)) => {
                    key.columns.push(text(&row, "from"));
                    key.referenced_columns.push(text(&row, "to"));
                }
                None => foreign_keys.push((
                    id,
                    KeyShape {
                        columns: vec![text(&row, "from")],
                        referenced_table: text(&row, "table"),
                        referenced_columns: vec![text(&row, "to")],
                        on_delete: text(&row, "on_delete"),
                    },
                )),
            }
        }
        let mut foreign_keys: Vec<KeyShape> = foreign_keys.into_iter().map(|(_, key)| key).collect();
        foreign_keys.sort();

        let mut indexes = Vec::new();
        for row in pragma(db, format!("PRAGMA index_list(\"{}\")", name)).await {
            // Only indexes created by CREATE INDEX; skip autoindexes of keys
            if text(&row, "origin") != "c" {
                continue;
            }
            let index = text(&row, "name");
            let mut columns: Vec<(i64, String)> = pragma(db, format!("PRAGMA index_info(\"{}\")", index))
                .await
                .iter()
                .map(|col| (number(col, "seqno"), text(col, "name")))
                .collect();
            columns.sort();
            indexes.push(IndexShape {
                name: index,
                columns: columns.into_iter().map(|(_, c)| c).collect(),
                unique: number(&row, "unique") == 1,
                partial: number(&row, "partial") == 1,
            });
        }
        indexes.sort();

        tables.push(TableShape {
            name,
            columns,
            primary_key: key_columns.into_iter().map(|(_, c)| c).collect(),
            foreign_keys,
            indexes,
        });
    }
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    tables
}

async fn assert_live_matches(db: &DatabaseConnection, expected: &Schema, when: &str) {
    let live = live_shape(db).await;
    let model = model_shape(expected);
    let live_names: Vec<&str> = live.iter().map(|t| t.name.as_str()).collect();
    let model_names: Vec<&str> = model.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(live_names, model_names, "tables {}", when);
    for (live, model) in live.iter().zip(&model) {
        assert_eq!(live, model, "{} {}", live.name, when);
    }
}

async fn seed_conversation(
    db: &DatabaseConnection,
    company_id: i32,
    customer_phone: &str,
) -> Result<whatsapp_conversation::Model, sea_orm::DbErr> {
    whatsapp_conversation::ActiveModel {
        company_id: Set(company_id),
        customer_phone: Set(customer_phone.to_string()),
        business_phone: Set("+34910000000".to_string()),
        status: Set(ConversationStatus::Active),
        priority: Set(ConversationPriority::Normal),
        unread_count: Set(0),
        last_message_at: Set(None),
        customer_id: Set(None),
        assigned_user_id: Set(None),
        created_at: Set(at(3)),
        updated_at: Set(at(3)),
        source_channel: Set("whatsapp".to_string()),
        session_id: Set(None),
        customer_email: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

async fn seed_message(
    db: &DatabaseConnection,
    conversation: &whatsapp_conversation::Model,
    provider_message_id: Option<&str>,
    day: u32,
) -> Result<whatsapp_messages::Model, sea_orm::DbErr> {
    whatsapp_messages::ActiveModel {
        company_id: Set(conversation.company_id),
        conversation_id: Set(conversation.id),
        direction: Set(MessageDirection::Inbound),
        status: Set(MessageStatus::Received),
        message_type: Set(MessageType::Text),
        from_address: Set(conversation.customer_phone.clone()),
        to_address: Set(conversation.business_phone.clone()),
        body: Set(Some("Hola".to_string())),
        media_url: Set(None),
        provider_message_id: Set(provider_message_id.map(str::to_string)),
        created_at: Set(at(day)),
        updated_at: Set(at(day)),
        sent_at: Set(None),
        read_at: Set(None),
        is_deleted: Set(false),
        deleted_at: Set(None),
        deleted_by_user_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

async fn seed_page(db: &DatabaseConnection, company_id: i32) -> pages::Model {
    pages::ActiveModel {
        company_id: Set(company_id),
        title: Set("Inicio".to_string()),
        slug: Set("inicio".to_string()),
        content: Set(None),
        is_published: Set(false),
        created_at: Set(at(1)),
        updated_at: Set(at(1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("page insert")
}

// ===== Ledger =====

#[tokio::test]
async fn test_baseline_applies_and_reverts() {
    print_test_header(
        "test_baseline_applies_and_reverts",
        &["The baseline step builds every final table on SQLite and the ledger records it."],
    );
    let db = sqlite().await;
    let service = live_service(&db, baseline_catalog());
    let last = catalog().steps().last().unwrap().id();

    let report = service.up().await.expect("baseline up");
    assert_eq!(report.current, Some(last));

    let tables = table_names(&db).await;
    println!("   tables: {:?}", tables);
    for expected in [
        "Companies",
        "ContactMessages",
        "Perros",
        "PublishedSnapshots",
        "WhatsAppConfigs",
        "WhatsAppConversation",
        "WhatsAppMessages",
        "schema_history",
    ] {
        assert!(tables.iter().any(|t| t == expected), "{} missing", expected);
    }
    assert!(!tables.iter().any(|t| t == "GreenApiWhatsAppConfigs"));
    assert_live_matches(&db, &catalog().final_schema().unwrap(), "after baseline up").await;

    let rows = history::Entity::find().all(&*db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id as u64, last.0);
    assert_eq!(rows[0].checksum.len(), 64);

    service.down(1).await.expect("baseline down");
    assert_eq!(table_names(&db).await, vec!["schema_history".to_string()]);
    assert_live_matches(&db, &Schema::empty(), "after baseline down").await;
    assert_eq!(history::Entity::find().count(&*db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_entities_match_the_live_schema() {
    let db = live_site().await;

    assert_eq!(companies::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(users::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(customers::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(pages::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(contact_messages::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(contact_notification_settings::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(notifications::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(email_provider_settings::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(perros::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(published_snapshots::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(whatsapp_configs::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(whatsapp_conversation::Entity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(whatsapp_messages::Entity::find().count(&*db).await.unwrap(), 0);

    let perro = perros::ActiveModel {
        nombre: Set("Toby".to_string()),
        raza: Set("Galgo".to_string()),
        edad: Set(4),
        created_at: Set(at(5)),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();
    assert_eq!(perro.id, 1);

    // Every tenant entity round-trips one row through its own columns
    let acme = seed_company(&db, "acme").await;
    let editor = seed_user(&db, acme.id, "editor@acme.test").await;

    let message = contact_messages::ActiveModel {
        company_id: Set(acme.id),
        name: Set("Marta Gil".to_string()),
        email: Set("marta@example.test".to_string()),
        phone: Set(Some("+34600000010".to_string())),
        subject: Set(Some("Presupuesto".to_string())),
        message: Set("Quisiera un presupuesto.".to_string()),
        is_read: Set(false),
        created_at: Set(at(2)),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();
    let reloaded = contact_messages::Entity::find_by_id(message.id)
        .one(&*db)
        .await
        .unwrap()
        .expect("contact message stored");
    assert_eq!(reloaded.subject.as_deref(), Some("Presupuesto"));
    assert_eq!(reloaded.created_at, at(2));

    let settings = contact_notification_settings::ActiveModel {
        company_id: Set(acme.id),
        email_notifications_enabled: Set(true),
        notification_email: Set(Some("avisos@acme.test".to_string())),
        toast_notifications_enabled: Set(true),
        toast_message_template: Set("Nuevo mensaje de {name}".to_string()),
        email_subject_template: Set("Nuevo contacto".to_string()),
        email_body_template: Set(None),
        created_at: Set(at(2)),
        updated_at: Set(at(2)),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();
    assert!(settings.email_notifications_enabled);
    assert_eq!(settings.email_body_template, None);

    let notification = notifications::ActiveModel {
        company_id: Set(acme.id),
        user_id: Set(Some(editor.id)),
        r#type: Set("contact_message".to_string()),
        title: Set("Nuevo mensaje".to_string()),
        message: Set("Marta Gil escribió".to_string()),
        related_entity_type: Set(Some("ContactMessage".to_string())),
        related_entity_id: Set(Some(message.id.to_string())),
        is_read: Set(false),
        read_at: Set(None),
        created_at: Set(at(3)),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();
    let reloaded = notifications::Entity::find_by_id(notification.id)
        .one(&*db)
        .await
        .unwrap()
        .expect("notification stored");
    assert_eq!(reloaded.user_id, Some(editor.id));
    assert_eq!(reloaded.related_entity_id, Some(message.id.to_string()));

    let provider = email_provider_settings::ActiveModel {
        company_id: Set(acme.id),
        provider: Set(EmailProvider::Mailgun),
        smtp_host: Set(None),
        smtp_port: Set(None),
        smtp_username: Set(None),
        smtp_password: Set(None),
        smtp_password_mask: Set(None),
        api_key: Set(None),
        api_key_mask: Set(None),
        from_email: Set("hola@acme.test".to_string()),
        from_name: Set(Some("Acme".to_string())),
        use_ssl: Set(true),
        is_active: Set(true),
        created_at: Set(at(3)),
        updated_at: Set(at(3)),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();
    let reloaded = email_provider_settings::Entity::find_by_id(provider.id)
        .one(&*db)
        .await
        .unwrap()
        .expect("provider settings stored");
    assert_eq!(reloaded.provider, EmailProvider::Mailgun);
    assert_eq!(reloaded.from_name.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_incremental_steps_and_unsupported_alter() {
    print_test_header(
        "test_incremental_steps_and_unsupported_alter",
        &[
            "Table-creating steps run one by one on SQLite.",
            "An ALTER COLUMN step is refused before any transaction and the ledger stays put.",
        ],
    );
    let db = sqlite().await;
    let prefix = catalog().position(WIDEN_ADDRESSES).unwrap();

    let report = live_service(&db, catalog_prefix(prefix)).up().await.unwrap();
    assert_eq!(report.executed(), prefix);
    assert!(table_names(&db).await.iter().any(|t| t == "GreenApiWhatsAppConfigs"));
    let before_widen = catalog().schema_at(prefix).unwrap();
    assert_live_matches(&db, &before_widen, "before the refused step").await;

    let full = live_service(&db, catalog());
    let err = full.apply(WIDEN_ADDRESSES).await.unwrap_err();
    assert!(matches!(err, MigrationError::Unsupported { .. }), "{}", err);
    assert_eq!(history::Entity::find().count(&*db).await.unwrap(), prefix as u64);
    assert_live_matches(&db, &before_widen, "after the refused step").await;

    let status = full.status().await.unwrap();
    assert_eq!(status.applied.len(), prefix);
    assert_eq!(status.pending.first().map(String::as_str), Some("20250612150000_WidenWhatsAppMessageAddresses"));

    full.down(prefix).await.unwrap();
    assert_eq!(table_names(&db).await, vec!["schema_history".to_string()]);
}

#[tokio::test]
async fn test_live_schema_tracks_the_model_step_by_step() {
    print_test_header(
        "test_live_schema_tracks_the_model_step_by_step",
        &[
            "After every step applied or reverted on SQLite, the columns, keys and indexes read",
            "back from the database equal the model at that version.",
        ],
    );
    let db = sqlite().await;
    let catalog = catalog();
    let runnable = catalog.position(WIDEN_ADDRESSES).unwrap();
    let service = live_service(&db, catalog_prefix(runnable));
    let steps = &catalog.steps()[..runnable];

    println!("\n📝 Stage 1: apply one step at a time");
    for (applied, step) in steps.iter().enumerate() {
        service.apply(step.id()).await.unwrap();
        let expected = catalog.schema_at(applied + 1).unwrap();
        assert_live_matches(&db, &expected, &format!("after applying {}", step.label())).await;
        println!("   {} matches", step.label());
    }

    println!("\n📝 Stage 2: revert one step at a time");
    for (remaining, step) in steps.iter().enumerate().rev() {
        service.revert(step.id()).await.unwrap();
        let expected = catalog.schema_at(remaining).unwrap();
        assert_live_matches(&db, &expected, &format!("after reverting {}", step.label())).await;
        println!("   {} reverted", step.label());
    }
    assert_eq!(table_names(&db).await, vec!["schema_history".to_string()]);
}

#[tokio::test]
async fn test_failed_step_rolls_back_its_transaction() {
    let db = sqlite().await;
    // Collides with the second table of AddContactMessages
    db.execute_unprepared("CREATE TABLE \"ContactNotificationSettings\" (\"Id\" integer)")
        .await
        .unwrap();

    let service = live_service(&db, catalog_prefix(2));
    let err = service.up().await.unwrap_err();
    match &err {
        MigrationError::Database { step, location, .. } => {
            assert_eq!(step, "20250402141500_AddContactMessages");
            assert_eq!(location.table, "ContactNotificationSettings");
        }
        other => panic!("expected a database error, got {}", other),
    }

    let tables = table_names(&db).await;
    assert!(tables.iter().any(|t| t == "Companies"), "first step stays applied");
    assert!(!tables.iter().any(|t| t == "ContactMessages"), "partial step rolled back");
    let rows = history::Entity::find().all(&*db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "InitialCreate");
}

// ===== Constraints =====

#[tokio::test]
async fn test_unique_constraints_are_enforced() {
    let db = live_site().await;
    let acme = seed_company(&db, "acme").await;
    let globex = seed_company(&db, "globex").await;

    let duplicate_subdomain = companies::ActiveModel {
        name: Set("Acme again".to_string()),
        subdomain: Set("acme".to_string()),
        custom_domain: Set(None),
        is_active: Set(true),
        created_at: Set(at(1)),
        updated_at: Set(at(1)),
        ..Default::default()
    }
    .insert(&*db)
    .await;
    assert!(duplicate_subdomain.is_err());

    seed_conversation(&db, acme.id, "+34600000001").await.unwrap();
    assert!(seed_conversation(&db, acme.id, "+34600000001").await.is_err());
    // Same phones under another tenant are fine
    let other = seed_conversation(&db, globex.id, "+34600000001").await.unwrap();

    seed_message(&db, &other, Some("wamid.1"), 4).await.unwrap();
    assert!(seed_message(&db, &other, Some("wamid.1"), 5).await.is_err());
    seed_message(&db, &other, None, 6).await.unwrap();
    seed_message(&db, &other, None, 7).await.unwrap();

    let config = |company_id: i32| whatsapp_configs::ActiveModel {
        company_id: Set(company_id),
        provider: Set(WhatsAppProvider::Twilio),
        is_active: Set(true),
        created_at: Set(at(2)),
        updated_at: Set(at(2)),
        ..Default::default()
    };
    config(acme.id).insert(&*db).await.unwrap();
    assert!(config(acme.id).insert(&*db).await.is_err());
    config(globex.id).insert(&*db).await.unwrap();
}

#[tokio::test]
async fn test_company_delete_cascades_and_user_delete_sets_null() {
    print_test_header(
        "test_company_delete_cascades_and_user_delete_sets_null",
        &["Tenant rows go with their company; optional links are cleared, not deleted."],
    );
    let db = live_site().await;
    let acme = seed_company(&db, "acme").await;
    let globex = seed_company(&db, "globex").await;
    let agent = seed_user(&db, acme.id, "agent@acme.test").await;
    let customer = seed_customer(&db, acme.id, "+34600000002").await;

    let conversation = seed_conversation(&db, acme.id, "+34600000002").await.unwrap();
    let mut assigned: whatsapp_conversation::ActiveModel = conversation.into();
    assigned.customer_id = Set(Some(customer.id));
    assigned.assigned_user_id = Set(Some(agent.id));
    let conversation = assigned.update(&*db).await.unwrap();
    seed_message(&db, &conversation, Some("wamid.2"), 4).await.unwrap();
    let kept = seed_conversation(&db, globex.id, "+34600000003").await.unwrap();

    println!("\n📝 Stage 1: delete user and customer");
    users::Entity::delete_by_id(agent.id).exec(&*db).await.unwrap();
    customers::Entity::delete_by_id(customer.id).exec(&*db).await.unwrap();
    let reloaded = whatsapp_conversation::Entity::find_by_id(conversation.id)
        .one(&*db)
        .await
        .unwrap()
        .expect("conversation survives");
    assert_eq!(reloaded.assigned_user_id, None);
    assert_eq!(reloaded.customer_id, None);

    println!("\n📝 Stage 2: delete company");
    companies::Entity::delete_by_id(acme.id).exec(&*db).await.unwrap();
    assert!(whatsapp_conversation::Entity::find_by_id(conversation.id)
        .one(&*db)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        whatsapp_messages::Entity::find()
            .filter(whatsapp_messages::Column::CompanyId.eq(acme.id))
            .count(&*db)
            .await
            .unwrap(),
        0
    );
    assert!(whatsapp_conversation::Entity::find_by_id(kept.id)
        .one(&*db)
        .await
        .unwrap()
        .is_some());
}

// ===== Row helpers =====

#[tokio::test]
async fn test_soft_delete_keeps_row_and_link() {
    let db = live_site().await;
    let acme = seed_company(&db, "acme").await;
    let moderator = seed_user(&db, acme.id, "mod@acme.test").await;
    let conversation = seed_conversation(&db, acme.id, "+34600000004").await.unwrap();
    let first = seed_message(&db, &conversation, Some("wamid.3"), 4).await.unwrap();
    let second = seed_message(&db, &conversation, Some("wamid.4"), 5).await.unwrap();

    let repo = SiteDataRepository::new(db.clone());
    assert!(repo
        .soft_delete_message(acme.id, first.id, Some(moderator.id), at(6))
        .await
        .unwrap());
    assert!(!repo
        .soft_delete_message(acme.id, first.id, Some(moderator.id), at(7))
        .await
        .unwrap());

    let row = whatsapp_messages::Entity::find_by_id(first.id)
        .one(&*db)
        .await
        .unwrap()
        .expect("row kept");
    assert!(row.is_deleted);
    assert_eq!(row.deleted_at, Some(at(6)));
    assert_eq!(row.deleted_by_user_id, Some(moderator.id));
    assert_eq!(row.conversation_id, conversation.id);

    let visible = repo.visible_messages(acme.id, conversation.id).await.unwrap();
    assert_eq!(visible.iter().map(|m| m.id).collect::<Vec<_>>(), vec![second.id]);

    // Other tenants cannot touch the message
    let globex = seed_company(&db, "globex").await;
    assert!(!repo
        .soft_delete_message(globex.id, second.id, None, at(8))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_snapshot_versions_increase() {
    let db = live_site().await;
    let acme = seed_company(&db, "acme").await;
    let page = seed_page(&db, acme.id).await;
    let repo = SiteDataRepository::new(db.clone());

    let mut versions = Vec::new();
    for day in 2..5 {
        let content = serde_json::json!({ "blocks": [{ "type": "hero", "day": day }] });
        let snapshot = repo
            .publish_snapshot(acme.id, page.id, content, at(day))
            .await
            .unwrap();
        versions.push(snapshot.version);
    }
    assert_eq!(versions, vec![1, 2, 3]);

    let snapshots = published_snapshots::Entity::find()
        .filter(published_snapshots::Column::PageId.eq(page.id))
        .all(&*db)
        .await
        .unwrap();
    let fresh: Vec<i32> = snapshots.iter().filter(|s| !s.is_stale).map(|s| s.version).collect();
    assert_eq!(fresh, vec![3]);

    assert_eq!(repo.mark_stale(acme.id, page.id).await.unwrap(), 1);

    let duplicate = published_snapshots::ActiveModel {
        company_id: Set(acme.id),
        page_id: Set(page.id),
        version: Set(2),
        content: Set(serde_json::json!({})),
        is_stale: Set(false),
        published_at: Set(at(9)),
        created_at: Set(at(9)),
        ..Default::default()
    }
    .insert(&*db)
    .await;
    assert!(duplicate.is_err(), "page versions are unique");
}

#[tokio::test]
async fn test_whatsapp_tokens_are_stored_with_masks() {
    let db = live_site().await;
    let acme = seed_company(&db, "acme").await;
    let repo = SiteDataRepository::new(db.clone());

    assert!(repo
        .store_whatsapp_tokens(acme.id, Some("token"), None, at(3))
        .await
        .is_err());

    whatsapp_configs::ActiveModel {
        company_id: Set(acme.id),
        provider: Set(WhatsAppProvider::Twilio),
        is_active: Set(true),
        created_at: Set(at(2)),
        updated_at: Set(at(2)),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .unwrap();

    let saved = repo
        .store_whatsapp_tokens(acme.id, Some("ACa1b2c3d4e5f6"), Some("short"), at(3))
        .await
        .unwrap();
    assert_eq!(saved.auth_token.as_deref(), Some("ACa1b2c3d4e5f6"));
    assert_eq!(saved.auth_token_mask.as_deref(), Some("****e5f6"));
    assert_eq!(saved.api_token_mask.as_deref(), Some("****"));
    assert_eq!(saved.updated_at, at(3));
}

#[tokio::test]
async fn test_email_provider_secrets_are_stored_with_masks() {
    let db = live_site().await;
    let acme = seed_company(&db, "acme").await;
    let globex = seed_company(&db, "globex").await;
    let repo = SiteDataRepository::new(db.clone());

    assert!(repo
        .store_email_provider_secrets(acme.id, Some("s3cret-password"), None, at(3))
        .await
        .is_err());

    let settings = |company_id: i32| email_provider_settings::ActiveModel {
        company_id: Set(company_id),
        provider: Set(EmailProvider::Smtp),
        smtp_host: Set(Some("smtp.acme.test".to_string())),
        smtp_port: Set(Some(587)),
        smtp_username: Set(Some("mailer".to_string())),
        from_email: Set("hola@acme.test".to_string()),
        use_ssl: Set(true),
        is_active: Set(true),
        created_at: Set(at(2)),
        updated_at: Set(at(2)),
        ..Default::default()
    };
    settings(acme.id).insert(&*db).await.unwrap();
    settings(globex.id).insert(&*db).await.unwrap();

    let saved = repo
        .store_email_provider_secrets(acme.id, Some("s3cret-password"), Some("key-9f8e7d6c5b"), at(4))
        .await
        .unwrap();
    assert_eq!(saved.company_id, acme.id);
    assert_eq!(saved.updated_at, at(4));

    let stored = email_provider_settings::Entity::find()
        .filter(email_provider_settings::Column::CompanyId.eq(acme.id))
        .one(&*db)
        .await
        .unwrap()
        .expect("settings row");
    assert_eq!(stored.smtp_password.as_deref(), Some("s3cret-password"));
    assert_eq!(stored.smtp_password_mask.as_deref(), Some("****word"));
    assert_eq!(stored.api_key.as_deref(), Some("key-9f8e7d6c5b"));
    assert_eq!(stored.api_key_mask.as_deref(), Some("****6c5b"));

    // Only the given secret changes; the other pair is left as it was
    let saved = repo
        .store_email_provider_secrets(acme.id, None, Some("short"), at(5))
        .await
        .unwrap();
    assert_eq!(saved.smtp_password_mask.as_deref(), Some("****word"));
    assert_eq!(saved.api_key_mask.as_deref(), Some("****"));

    let untouched = email_provider_settings::Entity::find()
        .filter(email_provider_settings::Column::CompanyId.eq(globex.id))
        .one(&*db)
        .await
        .unwrap()
        .expect("other tenant row");
    assert_eq!(untouched.smtp_password, None);
    assert_eq!(untouched.api_key_mask, None);
}

// ===== sea-orm-migration adapter =====

#[tokio::test]
async fn test_migrator_adapter_runs_catalog_steps() {
    let db = sqlite().await;
    let prefix = catalog().position(WIDEN_ADDRESSES).unwrap() as u32;

    Migrator::up(&*db, Some(prefix)).await.expect("create-only steps run");
    let tables = table_names(&db).await;
    assert!(tables.iter().any(|t| t == "seaql_migrations"));
    assert!(tables.iter().any(|t| t == "WhatsAppMessages"));

    let err = Migrator::up(&*db, Some(1)).await.unwrap_err();
    assert!(err.to_string().contains("does not support"), "{}", err);

    Migrator::down(&*db, None).await.expect("all steps revert");
    assert_eq!(table_names(&db).await, vec!["seaql_migrations".to_string()]);
}
