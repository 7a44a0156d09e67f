//! SQLite implementation of the checkpoint store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Checkpoint, Config, LoopState, CHECKPOINT_VERSION};
use crate::domain::ports::CheckpointRepository;

#[derive(Clone)]
pub struct SqliteCheckpointRepository {
    pool: SqlitePool,
}

impl SqliteCheckpointRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointRepository for SqliteCheckpointRepository {
    async fn save(
        &self,
        session_id: &str,
        state: &LoopState,
        config: &Config,
        checkpoint_id: Option<Uuid>,
    ) -> DomainResult<Uuid> {
        let id = checkpoint_id.unwrap_or_else(Uuid::new_v4);
        let state_json = serde_json::to_string(state)?;
        let config_json = serde_json::to_string(config)?;

        sqlx::query(
            r"INSERT INTO checkpoints (id, session_id, version, created_at, state, config)
              VALUES (?, ?, ?, ?, ?, ?)
              ON CONFLICT(id) DO UPDATE SET
                session_id = excluded.session_id,
                version = excluded.version,
                created_at = excluded.created_at,
                state = excluded.state,
                config = excluded.config",
        )
        .bind(id.to_string())
        .bind(session_id)
        .bind(i64::from(CHECKPOINT_VERSION))
        .bind(format_datetime(&Utc::now()))
        .bind(&state_json)
        .bind(&config_json)
        .execute(&self.pool)
        .await?;

        info!(checkpoint_id = %id, session_id = %session_id, iteration = state.iteration, "checkpoint saved");
        Ok(id)
    }

    async fn load(&self, checkpoint_id: Uuid) -> DomainResult<Checkpoint> {
        let row: Option<CheckpointRow> = sqlx::query_as(
            "SELECT id, session_id, version, created_at, state, config FROM checkpoints WHERE id = ?",
        )
        .bind(checkpoint_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let checkpoint: Checkpoint = row
            .ok_or(DomainError::CheckpointNotFound(checkpoint_id))?
            .try_into()?;
        debug!(checkpoint_id = %checkpoint_id, session_id = %checkpoint.session_id, "checkpoint loaded");
        Ok(checkpoint)
    }

    async fn latest(&self, session_id: &str) -> DomainResult<Option<Checkpoint>> {
        let row: Option<CheckpointRow> = sqlx::query_as(
            "SELECT id, session_id, version, created_at, state, config FROM checkpoints
             WHERE session_id = ? ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, session_id: &str) -> DomainResult<Vec<Checkpoint>> {
        let rows: Vec<CheckpointRow> = sqlx::query_as(
            "SELECT id, session_id, version, created_at, state, config FROM checkpoints
             WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct CheckpointRow {
    id: String,
    session_id: String,
    version: i64,
    created_at: String,
    state: String,
    config: String,
}

impl TryFrom<CheckpointRow> for Checkpoint {
    type Error = DomainError;

    fn try_from(row: CheckpointRow) -> Result<Self, Self::Error> {
        let id = parse_uuid(&row.id)?;
        let version = u32::try_from(row.version)
            .map_err(|_| DomainError::Serialization(format!("Invalid checkpoint version: {}", row.version)))?;

        // Check the version before touching the payload; a newer schema may not parse.
        if version > CHECKPOINT_VERSION {
            return Err(DomainError::IncompatibleCheckpoint {
                id,
                found: version,
                supported: CHECKPOINT_VERSION,
            });
        }

        Ok(Self {
            id,
            session_id: row.session_id,
            version,
            created_at: parse_datetime(&row.created_at)?,
            state: serde_json::from_str(&row.state)?,
            config: serde_json::from_str(&row.config)?,
        })
    }
}
