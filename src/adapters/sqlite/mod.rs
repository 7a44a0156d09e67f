//! SQLite persistence for the outcome ledger and checkpoints.

pub mod checkpoint_repository;
pub mod connection;
pub mod migrations;
pub mod outcome_repository;

pub use checkpoint_repository::SqliteCheckpointRepository;
pub use connection::{create_pool, create_test_pool, database_url, verify_connection, ConnectionError, PoolConfig};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use outcome_repository::SqliteOutcomeRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::Serialization(e.to_string()))
}

/// Parse an optional UUID string from a SQLite row field.
pub fn parse_optional_uuid(s: Option<String>) -> DomainResult<Option<Uuid>> {
    s.map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| DomainError::Serialization(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::Serialization(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fixed-width RFC3339 so that text comparison in SQL orders chronologically.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

impl From<DatabaseError> for DomainError {
    fn from(err: DatabaseError) -> Self {
        Self::Storage(err.to_string())
    }
}

pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(&database_url(&config.path), Some(PoolConfig::from(config))).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
