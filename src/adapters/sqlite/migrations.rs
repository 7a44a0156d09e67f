//! Embedded schema migrations.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError {
        version: i64,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub sql: String,
}

/// Applies pending migrations in version order and records each in `schema_migrations`.
pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the number of migrations applied by this call.
    pub async fn run_embedded_migrations(&self, mut migrations: Vec<Migration>) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current_version = self.get_current_version().await?;
        migrations.sort_by_key(|m| m.version);
        let pending: Vec<_> = migrations
            .into_iter()
            .filter(|m| m.version > current_version)
            .collect();

        for migration in &pending {
            self.apply_migration(migration).await?;
            info!(version = migration.version, description = %migration.description, "migration applied");
        }

        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MigrationError::ExecutionError { version: 0, source: e })?;
        Ok(())
    }

    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let (version,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(MigrationError::VersionCheckError)?;
        Ok(version)
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), MigrationError> {
        let to_error = |e| MigrationError::ExecutionError {
            version: migration.version,
            source: e,
        };
        let mut tx = self.pool.begin().await.map_err(to_error)?;
        sqlx::raw_sql(&migration.sql)
            .execute(&mut *tx)
            .await
            .map_err(to_error)?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(to_error)?;
        tx.commit().await.map_err(to_error)
    }
}

pub fn outcome_records_migration() -> Migration {
    Migration {
        version: 1,
        description: "Outcome ledger".to_string(),
        sql: include_str!("../../../migrations/001_outcome_records.sql").to_string(),
    }
}

pub fn checkpoints_migration() -> Migration {
    Migration {
        version: 2,
        description: "Checkpoints".to_string(),
        sql: include_str!("../../../migrations/002_checkpoints.sql").to_string(),
    }
}

pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![outcome_records_migration(), checkpoints_migration()]
}
