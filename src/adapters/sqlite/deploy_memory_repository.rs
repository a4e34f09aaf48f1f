//! SQLite implementation of the DeployMemoryRepository.
//!
//! Rows are keyed `(pk, sk)` with `pk = FP#<fingerprint>` and
//! `sk = <rfc3339 micros>#<event id>`. Timestamps are stored as fixed-width
//! UTC strings so string comparison orders them chronologically.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DeployMemoryEvent, ErrorClass, FailureSignal};
use crate::domain::ports::DeployMemoryRepository;

use super::migrations::is_valid_table_name;

#[derive(Clone)]
pub struct SqliteDeployMemoryRepository {
    pool: SqlitePool,
    table: String,
}

impl SqliteDeployMemoryRepository {
    /// Repository over `table`, which must already be migrated.
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> DomainResult<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(DomainError::ValidationFailed(format!("invalid table name {table:?}")));
        }
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl DeployMemoryRepository for SqliteDeployMemoryRepository {
    async fn insert(&self, event: &DeployMemoryEvent) -> DomainResult<()> {
        let tokens_json = serde_json::to_string(&event.tokens)?;
        let signals_json = serde_json::to_string(&event.raw_signals)?;

        let sql = format!(
            r#"INSERT INTO {} (pk, sk, id, fingerprint_id, error_class, service, confidence,
               tokens, raw_signals, stack_name, region, created_at, expires_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            self.table
        );
        sqlx::query(&sql)
            .bind(event.partition_key())
            .bind(event.sort_key())
            .bind(event.id.to_string())
            .bind(&event.fingerprint_id)
            .bind(event.error_class.as_str())
            .bind(&event.service)
            .bind(event.confidence)
            .bind(&tokens_json)
            .bind(&signals_json)
            .bind(&event.stack_name)
            .bind(&event.region)
            .bind(format_time(event.timestamp))
            .bind(event.expires_at.map(format_time))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_by_fingerprint(
        &self,
        fingerprint_id: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<DeployMemoryEvent>> {
        let sql = format!(
            "SELECT * FROM {} WHERE pk = ? AND (expires_at IS NULL OR expires_at > ?) \
             ORDER BY sk DESC LIMIT ?",
            self.table
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(crate::domain::models::event::partition_key(fingerprint_id))
            .bind(format_time(now))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE expires_at IS NOT NULL AND expires_at <= ?",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(format_time(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    fingerprint_id: String,
    error_class: String,
    service: String,
    confidence: f64,
    tokens: Option<String>,
    raw_signals: Option<String>,
    stack_name: Option<String>,
    region: String,
    created_at: String,
    expires_at: Option<String>,
}

impl TryFrom<EventRow> for DeployMemoryEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let id = super::parse_uuid(&row.id)?;
        let error_class = ErrorClass::from_str(&row.error_class).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown error class {}", row.error_class))
        })?;
        let tokens: BTreeSet<String> = super::parse_json_or_default(row.tokens)?;
        let raw_signals: Vec<FailureSignal> = super::parse_json_or_default(row.raw_signals)?;
        let timestamp = super::parse_datetime(&row.created_at)?;
        let expires_at = super::parse_optional_datetime(row.expires_at)?;

        Ok(DeployMemoryEvent {
            id,
            fingerprint_id: row.fingerprint_id,
            error_class,
            service: row.service,
            confidence: row.confidence,
            tokens,
            raw_signals,
            stack_name: row.stack_name,
            region: row.region,
            timestamp,
            expires_at,
        })
    }
}
