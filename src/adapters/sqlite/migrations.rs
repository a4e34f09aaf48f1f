//! SQLite database migration management.
//!
//! Migrations are embedded SQL with a `{table}` placeholder for the
//! configured event table. Applied versions are tracked per table, so two
//! tables in one database migrate independently.

use sqlx::{Executor, SqlitePool};
use thiserror::Error;

/// Placeholder substituted with the event table name.
pub const TABLE_PLACEHOLDER: &str = "{table}";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError { version: i64, #[source] source: sqlx::Error },
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub sql: String,
}

impl Migration {
    fn render(&self, table: &str) -> String {
        self.sql.replace(TABLE_PLACEHOLDER, table)
    }
}

/// Whether `name` is safe to splice into SQL as a bare identifier.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct Migrator {
    pool: SqlitePool,
    table: String,
}

impl Migrator {
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> Result<Self, MigrationError> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(MigrationError::InvalidTableName(table));
        }
        Ok(Self { pool, table })
    }

    pub async fn run_embedded_migrations(&self, migrations: Vec<Migration>) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current_version = self.get_current_version().await?;
        let pending: Vec<_> = migrations.into_iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            return Ok(0);
        }

        for migration in &pending {
            self.apply_migration(migration).await?;
            tracing::debug!(
                table = %self.table,
                version = migration.version,
                description = %migration.description,
                "Applied migration"
            );
        }

        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                table_name TEXT NOT NULL,
                version INTEGER NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT,
                PRIMARY KEY (table_name, version)
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MigrationError::ExecutionError { version: 0, source: e })?;
        Ok(())
    }

    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let result: Option<(i64,)> = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations WHERE table_name = ?",
        )
        .bind(&self.table)
        .fetch_optional(&self.pool)
        .await
        .map_err(MigrationError::VersionCheckError)?;
        Ok(result.map(|(v,)| v).unwrap_or(0))
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), MigrationError> {
        let to_err = |e: sqlx::Error| MigrationError::ExecutionError { version: migration.version, source: e };
        let mut tx = self.pool.begin().await.map_err(to_err)?;

        let sql = migration.render(&self.table);
        (&mut *tx).execute(sql.as_str()).await.map_err(to_err)?;
        sqlx::query("INSERT INTO schema_migrations (table_name, version, description) VALUES (?, ?, ?)")
            .bind(&self.table)
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(to_err)?;

        tx.commit().await.map_err(to_err)
    }
}

pub fn deploy_memory_events_migration() -> Migration {
    Migration {
        version: 1,
        description: "Deploy memory events table".to_string(),
        sql: include_str!("../../../migrations/001_deploy_memory_events.sql").to_string(),
    }
}

pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![deploy_memory_events_migration()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_test_pool;

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("deploy_memory_events"));
        assert!(is_valid_table_name("_t1"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("1table"));
        assert!(!is_valid_table_name("events; DROP TABLE x"));
        assert!(!is_valid_table_name("my-table"));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent_per_table() {
        let pool = create_test_pool().await.unwrap();

        let first = Migrator::new(pool.clone(), "events_a").unwrap();
        assert_eq!(first.run_embedded_migrations(all_embedded_migrations()).await.unwrap(), 1);
        assert_eq!(first.run_embedded_migrations(all_embedded_migrations()).await.unwrap(), 0);
        assert_eq!(first.get_current_version().await.unwrap(), 1);

        let second = Migrator::new(pool.clone(), "events_b").unwrap();
        assert_eq!(second.get_current_version().await.unwrap(), 0);
        assert_eq!(second.run_embedded_migrations(all_embedded_migrations()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_unsafe_table() {
        let pool = create_test_pool().await.unwrap();
        assert!(matches!(
            Migrator::new(pool, "events; DROP TABLE schema_migrations"),
            Err(MigrationError::InvalidTableName(_))
        ));
    }
}
