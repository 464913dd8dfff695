//! Model-level tests over the full migration history

use site_schema::contract::{ColumnType, DefaultValue, Literal, ReferentialAction, Schema, StepId};
use site_schema::domain::{apply_all, verify_catalog, verify_step, TenancyPolicy};

mod common;
use common::{catalog, print_test_header};

const ADD_PERRO_TABLE: StepId = StepId(20250625100000);
const ADD_SOFT_DELETE: StepId = StepId(20250702094500);

#[test]
fn test_every_step_reverts_to_its_prior_schema() {
    print_test_header(
        "test_every_step_reverts_to_its_prior_schema",
        &["Apply each step forward then backward on the schema it follows."],
    );
    let catalog = catalog();

    let mut schema = Schema::empty();
    for step in catalog.steps() {
        println!("   {}", step.label());
        schema = verify_step(&schema, step).expect("step must revert cleanly");
    }
    assert!(schema.structurally_eq(&catalog.final_schema().unwrap()));
}

#[test]
fn test_full_history_unwinds_to_empty() {
    let catalog = catalog();
    let report = verify_catalog(&catalog, &TenancyPolicy::default());
    assert!(report.is_ok(), "{:?}", report.findings);
    assert_eq!(report.steps_checked, catalog.len());

    let mut schema = catalog.final_schema().unwrap();
    for step in catalog.steps().iter().rev() {
        apply_all(&mut schema, &step.backward()).unwrap();
    }
    assert!(schema.is_empty(), "left behind: {:?}", schema);
}

#[test]
fn test_tenant_isolation_holds_at_every_version() {
    let catalog = catalog();
    let policy = TenancyPolicy::default();
    for applied in 0..=catalog.len() {
        let schema = catalog.schema_at(applied).unwrap();
        let violations = policy.check(&schema);
        assert!(violations.is_empty(), "after {} steps: {:?}", applied, violations);
    }
}

#[test]
fn test_add_perro_table_scenario() {
    print_test_header(
        "test_add_perro_table_scenario",
        &[
            "Conversations table is renamed, Perros appears and the Green API table goes away.",
            "Reverting restores all three.",
        ],
    );
    let catalog = catalog();
    let position = catalog.position(ADD_PERRO_TABLE).unwrap();
    let before = catalog.schema_at(position).unwrap();
    let after = catalog.schema_at(position + 1).unwrap();

    println!("\n📝 Stage 1: forward");
    assert!(after.contains_table("WhatsAppConversation"));
    assert!(!after.contains_table("WhatsAppConversations"));
    assert!(!after.contains_table("GreenApiWhatsAppConfigs"));

    let perros = after.table("Perros").expect("Perros exists");
    let columns: Vec<&str> = perros.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, ["Id", "Nombre", "Raza", "Edad", "CreatedAt"]);
    assert!(perros.find_column("Id").unwrap().identity);

    let conversation = after.table("WhatsAppConversation").unwrap();
    assert_eq!(
        conversation.primary_key.as_ref().map(|pk| pk.name.as_str()),
        Some("PK_WhatsAppConversation")
    );
    assert!(conversation.find_index("IX_WhatsAppConversation_SessionId").is_some());
    assert!(conversation
        .indexes
        .iter()
        .all(|i| i.name.starts_with("IX_WhatsAppConversation_")));

    let messages = after.table("WhatsAppMessages").unwrap();
    assert!(messages
        .foreign_keys
        .iter()
        .any(|k| k.referenced_table == "WhatsAppConversation" && k.on_delete == ReferentialAction::Cascade));
    assert!(after.references_to("WhatsAppConversations").next().is_none());

    println!("\n📝 Stage 2: backward");
    let step = catalog.get(ADD_PERRO_TABLE).unwrap();
    let mut reverted = after.clone();
    apply_all(&mut reverted, &step.backward()).unwrap();
    assert!(reverted.structurally_eq(&before));
    assert!(!reverted.contains_table("Perros"));
    assert!(reverted.contains_table("WhatsAppConversations"));

    let green_api = reverted.table("GreenApiWhatsAppConfigs").expect("Green API table restored");
    assert_eq!(green_api.columns.len(), 18);
    assert_eq!(green_api.indexes.len(), 4);
}

#[test]
fn test_soft_delete_scenario() {
    let catalog = catalog();
    let position = catalog.position(ADD_SOFT_DELETE).unwrap();
    let before = catalog.schema_at(position).unwrap();
    let after = catalog.schema_at(position + 1).unwrap();

    let old = before.table("WhatsAppMessages").unwrap();
    assert!(old.find_column("IsDeleted").is_none());
    assert!(old.find_column("CreatedAt").unwrap().default.is_none());

    let messages = after.table("WhatsAppMessages").unwrap();
    let is_deleted = messages.find_column("IsDeleted").unwrap();
    assert!(!is_deleted.nullable);
    assert_eq!(is_deleted.default, Some(DefaultValue::Literal(Literal::Bool(false))));
    assert!(messages.find_column("DeletedAt").unwrap().nullable);
    assert!(messages.find_column("DeletedByUserId").unwrap().nullable);
    assert_eq!(
        messages.find_column("CreatedAt").unwrap().default,
        Some(DefaultValue::Sql("CURRENT_TIMESTAMP".into()))
    );

    let deleted_by = messages
        .find_foreign_key("FK_WhatsAppMessages_Users_DeletedByUserId")
        .unwrap();
    assert_eq!(deleted_by.on_delete, ReferentialAction::SetNull);

    let visible = messages
        .find_index("IX_WhatsAppMessages_ConversationId_CreatedAt_Visible")
        .unwrap();
    assert_eq!(visible.filter.as_deref(), Some("\"IsDeleted\" = false"));

    // Soft delete never breaks the conversation link
    assert!(messages
        .foreign_keys
        .iter()
        .any(|k| k.columns == ["ConversationId"] && k.on_delete == ReferentialAction::Cascade));
}

#[test]
fn test_uniqueness_constraints_in_final_schema() {
    let schema = catalog().final_schema().unwrap();
    let expected = [
        ("Companies", "IX_Companies_Subdomain", None),
        ("Users", "IX_Users_CompanyId_Email", None),
        ("Pages", "IX_Pages_CompanyId_Slug", None),
        ("ContactNotificationSettings", "IX_ContactNotificationSettings_CompanyId", None),
        ("EmailProviderSettings", "IX_EmailProviderSettings_CompanyId", None),
        ("PublishedSnapshots", "IX_PublishedSnapshots_PageId_Version", None),
        ("WhatsAppConfigs", "IX_WhatsAppConfigs_CompanyId", None),
        (
            "WhatsAppConversation",
            "IX_WhatsAppConversation_CompanyId_CustomerPhone_BusinessPhone",
            None,
        ),
        (
            "WhatsAppMessages",
            "IX_WhatsAppMessages_ProviderMessageId",
            Some("\"ProviderMessageId\" IS NOT NULL"),
        ),
    ];

    for (table, index, filter) in expected {
        let found = schema
            .table(table)
            .and_then(|t| t.find_index(index))
            .unwrap_or_else(|| panic!("{}.{} missing", table, index));
        assert!(found.unique, "{} must be unique", index);
        assert_eq!(found.filter.as_deref(), filter, "{}", index);
    }
}

#[test]
fn test_contact_message_lengths_end_narrowed() {
    let schema = catalog().final_schema().unwrap();
    let email = schema
        .table("ContactMessages")
        .and_then(|t| t.find_column("Email"))
        .unwrap();
    assert_eq!(email.ty, ColumnType::Varchar(200));

    let template = schema
        .table("ContactNotificationSettings")
        .and_then(|t| t.find_column("ToastMessageTemplate"))
        .unwrap();
    assert_eq!(template.ty, ColumnType::Varchar(500));
    assert!(template.default.is_some());
}

#[test]
fn test_baseline_builds_final_schema() {
    let catalog = catalog();
    let baseline = catalog.baseline_step().unwrap();
    assert_eq!(baseline.id(), catalog.steps().last().unwrap().id());

    let mut schema = Schema::empty();
    apply_all(&mut schema, baseline.forward()).unwrap();
    assert!(schema.structurally_eq(&catalog.final_schema().unwrap()));

    apply_all(&mut schema, &baseline.backward()).unwrap();
    assert!(schema.is_empty());
}

#[test]
fn test_step_ids_parse_from_labels() {
    let catalog = catalog();
    for step in catalog.steps() {
        let parsed: StepId = step.label().parse().unwrap();
        assert_eq!(parsed, step.id());
    }
    assert!("2025-06-25".parse::<StepId>().is_err());
}
