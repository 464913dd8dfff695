//! SeaORM repository implementations

use crate::contract::MigrationError;
use crate::domain::credentials::MaskedSecret;
use crate::domain::ledger::{Ledger, LedgerEntry};
use crate::domain::repository::SchemaRepository;
use crate::domain::step::{Direction, MigrationStep};
use crate::domain::ops::SchemaOp;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;

use super::ddl;
use super::entity::{
    email_provider_settings, history, published_snapshots, whatsapp_configs, whatsapp_messages,
};

// ===== Schema Repository =====

/// Runs migration steps against a live database.
///
/// Each step's DDL and its history row change share one transaction.
pub struct SeaOrmSchemaRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSchemaRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create the history table if it does not exist yet
    pub async fn ensure_history_table(&self) -> Result<(), MigrationError> {
        let backend = self.db.get_database_backend();
        let mut stmt = sea_orm::Schema::new(backend).create_table_from_entity(history::Entity);
        stmt.if_not_exists();
        self.db
            .execute(backend.build(&stmt))
            .await
            .map_err(MigrationError::history("create history table"))?;
        Ok(())
    }

    async fn run_in(
        txn: &DatabaseTransaction,
        step: &MigrationStep,
        plan: &[(SchemaOp, Vec<String>)],
        direction: Direction,
        entry: &LedgerEntry,
    ) -> Result<(), MigrationError> {
        for (op, statements) in plan {
            for sql in statements {
                tracing::debug!(step = %step.label(), sql = %sql, "Executing DDL");
                txn.execute_unprepared(sql)
                    .await
                    .map_err(|source| MigrationError::Database {
                        step: step.label(),
                        operation: op.describe(),
                        location: op.location(),
                        source,
                    })?;
            }
        }

        match direction {
            Direction::Up => {
                history::Entity::insert(history::ActiveModel::from(entry))
                    .exec(txn)
                    .await
                    .map_err(MigrationError::history("record applied step"))?;
            }
            Direction::Down => {
                history::Entity::delete_by_id(entry.id.0 as i64)
                    .exec(txn)
                    .await
                    .map_err(MigrationError::history("remove reverted step"))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaRepository for SeaOrmSchemaRepository {
    async fn load_ledger(&self) -> Result<Ledger, MigrationError> {
        self.ensure_history_table().await?;
        let rows = history::Entity::find()
            .order_by_asc(history::Column::Id)
            .all(&*self.db)
            .await
            .map_err(MigrationError::history("load ledger"))?;
        Ok(Ledger::new(rows.into_iter().map(Into::into).collect()))
    }

    async fn execute(
        &self,
        step: &MigrationStep,
        direction: Direction,
        entry: &LedgerEntry,
    ) -> Result<(), MigrationError> {
        // Render everything first so an unsupported operation never opens a
        // transaction
        let plan = ddl::render_step(step, direction, self.db.get_database_backend())?;
        self.ensure_history_table().await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(MigrationError::history("begin transaction"))?;

        match Self::run_in(&txn, step, &plan, direction, entry).await {
            Ok(()) => txn
                .commit()
                .await
                .map_err(MigrationError::history("commit transaction")),
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::error!(step = %step.label(), error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    fn backend(&self) -> &'static str {
        ddl::backend_name(self.db.get_database_backend())
    }
}

// ===== Site Data Repository =====

/// Row-level helpers that keep the schema's documented data invariants.
///
/// Every call is scoped to one company.
pub struct SiteDataRepository {
    db: Arc<DatabaseConnection>,
}

impl SiteDataRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert the next snapshot version of a page and mark older ones stale
    pub async fn publish_snapshot(
        &self,
        company_id: i32,
        page_id: i32,
        content: serde_json::Value,
        published_at: DateTime<Utc>,
    ) -> Result<published_snapshots::Model> {
        use published_snapshots::Column;
        use sea_orm::ActiveValue::{NotSet, Set};

        let txn = self.db.begin().await?;
        let latest = published_snapshots::Entity::find()
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::PageId.eq(page_id))
            .order_by_desc(Column::Version)
            .one(&txn)
            .await?;
        let version = latest.map_or(1, |s| s.version + 1);

        published_snapshots::Entity::update_many()
            .col_expr(Column::IsStale, Expr::value(true))
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::PageId.eq(page_id))
            .filter(Column::IsStale.eq(false))
            .exec(&txn)
            .await?;

        let snapshot = published_snapshots::ActiveModel {
            id: NotSet,
            company_id: Set(company_id),
            page_id: Set(page_id),
            version: Set(version),
            content: Set(content),
            is_stale: Set(false),
            published_at: Set(published_at),
            created_at: Set(published_at),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        tracing::debug!(company_id, page_id, version, "Published page snapshot");
        Ok(snapshot)
    }

    /// Mark every snapshot of a page stale, e.g. after the page is edited
    pub async fn mark_stale(&self, company_id: i32, page_id: i32) -> Result<u64> {
        use published_snapshots::Column;

        let result = published_snapshots::Entity::update_many()
            .col_expr(Column::IsStale, Expr::value(true))
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::PageId.eq(page_id))
            .filter(Column::IsStale.eq(false))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Flag a message deleted without removing the row.
    ///
    /// Returns `false` if the message does not exist or is already deleted.
    pub async fn soft_delete_message(
        &self,
        company_id: i32,
        message_id: i32,
        deleted_by: Option<i32>,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool> {
        use whatsapp_messages::Column;

        let result = whatsapp_messages::Entity::update_many()
            .col_expr(Column::IsDeleted, Expr::value(true))
            .col_expr(Column::DeletedAt, Expr::value(deleted_at))
            .col_expr(Column::DeletedByUserId, Expr::value(deleted_by))
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::Id.eq(message_id))
            .filter(Column::IsDeleted.eq(false))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Messages of a conversation that are not soft deleted, oldest first
    pub async fn visible_messages(
        &self,
        company_id: i32,
        conversation_id: i32,
    ) -> Result<Vec<whatsapp_messages::Model>> {
        use whatsapp_messages::Column;

        Ok(whatsapp_messages::Entity::find()
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::ConversationId.eq(conversation_id))
            .filter(Column::IsDeleted.eq(false))
            .order_by_asc(Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Store provider tokens together with their display masks
    pub async fn store_whatsapp_tokens(
        &self,
        company_id: i32,
        auth_token: Option<&str>,
        api_token: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<whatsapp_configs::Model> {
        use sea_orm::ActiveValue::Set;

        let config = whatsapp_configs::Entity::find()
            .filter(whatsapp_configs::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("no WhatsApp config for company {}", company_id))?;

        let mut active: whatsapp_configs::ActiveModel = config.into();
        if let Some(token) = auth_token.map(MaskedSecret::new) {
            active.auth_token = Set(Some(token.value));
            active.auth_token_mask = Set(Some(token.mask));
        }
        if let Some(token) = api_token.map(MaskedSecret::new) {
            active.api_token = Set(Some(token.value));
            active.api_token_mask = Set(Some(token.mask));
        }
        active.updated_at = Set(updated_at);
        Ok(active.update(&*self.db).await?)
    }

    /// Store email provider secrets together with their display masks
    pub async fn store_email_provider_secrets(
        &self,
        company_id: i32,
        smtp_password: Option<&str>,
        api_key: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<email_provider_settings::Model> {
        use sea_orm::ActiveValue::Set;

        let settings = email_provider_settings::Entity::find()
            .filter(email_provider_settings::Column::CompanyId.eq(company_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("no email provider settings for company {}", company_id))?;

        let mut active: email_provider_settings::ActiveModel = settings.into();
        if let Some(secret) = smtp_password.map(MaskedSecret::new) {
            active.smtp_password = Set(Some(secret.value));
            active.smtp_password_mask = Set(Some(secret.mask));
        }
        if let Some(secret) = api_key.map(MaskedSecret::new) {
            active.api_key = Set(Some(secret.value));
            active.api_key_mask = Set(Some(secret.mask));
        }
        active.updated_at = Set(updated_at);
        Ok(active.update(&*self.db).await?)
    }
}
