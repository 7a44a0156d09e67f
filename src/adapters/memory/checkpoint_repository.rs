//! In-memory checkpoint store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Checkpoint, Config, LoopState};
use crate::domain::ports::CheckpointRepository;

/// Checkpoints kept in save order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointRepository {
    checkpoints: Arc<RwLock<Vec<Checkpoint>>>,
}

impl InMemoryCheckpointRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a prebuilt checkpoint as-is, e.g. one written by another build.
    pub async fn insert_raw(&self, checkpoint: Checkpoint) {
        let mut checkpoints = self.checkpoints.write().await;
        checkpoints.retain(|c| c.id != checkpoint.id);
        checkpoints.push(checkpoint);
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryCheckpointRepository {
    async fn save(
        &self,
        session_id: &str,
        state: &LoopState,
        config: &Config,
        checkpoint_id: Option<Uuid>,
    ) -> DomainResult<Uuid> {
        let mut checkpoint = Checkpoint::new(session_id, state.clone(), config.clone());
        if let Some(id) = checkpoint_id {
            checkpoint = checkpoint.with_id(id);
        }
        let id = checkpoint.id;

        let mut checkpoints = self.checkpoints.write().await;
        checkpoints.retain(|c| c.id != id);
        checkpoints.push(checkpoint);
        debug!(checkpoint_id = %id, session_id = %session_id, "checkpoint saved");
        Ok(id)
    }

    async fn load(&self, checkpoint_id: Uuid) -> DomainResult<Checkpoint> {
        let checkpoint = self
            .checkpoints
            .read()
            .await
            .iter()
            .find(|c| c.id == checkpoint_id)
            .cloned()
            .ok_or(DomainError::CheckpointNotFound(checkpoint_id))?;
        checkpoint.ensure_compatible()?;
        Ok(checkpoint)
    }

    async fn latest(&self, session_id: &str) -> DomainResult<Option<Checkpoint>> {
        Ok(self.list(session_id).await?.pop())
    }

    async fn list(&self, session_id: &str) -> DomainResult<Vec<Checkpoint>> {
        let mut matching: Vec<Checkpoint> = self
            .checkpoints
            .read()
            .await
            .iter()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.created_at);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CHECKPOINT_VERSION;

    fn state(iteration: u64) -> LoopState {
        LoopState {
            iteration,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_load_and_overwrite() {
        let repo = InMemoryCheckpointRepository::new();
        let config = Config::default();

        let id = repo.save("s1", &state(1), &config, None).await.unwrap();
        assert_eq!(repo.load(id).await.unwrap().state.iteration, 1);

        let same = repo.save("s1", &state(2), &config, Some(id)).await.unwrap();
        assert_eq!(same, id);
        assert_eq!(repo.load(id).await.unwrap().state.iteration, 2);
        assert_eq!(repo.list("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_checkpoint() {
        let repo = InMemoryCheckpointRepository::new();
        let id = Uuid::new_v4();
        assert!(matches!(repo.load(id).await, Err(DomainError::CheckpointNotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let repo = InMemoryCheckpointRepository::new();
        let config = Config::default();
        repo.save("a", &state(1), &config, None).await.unwrap();
        let latest_a = repo.save("a", &state(2), &config, None).await.unwrap();
        repo.save("b", &state(9), &config, None).await.unwrap();

        assert_eq!(repo.list("a").await.unwrap().len(), 2);
        assert_eq!(repo.latest("a").await.unwrap().unwrap().id, latest_a);
        assert!(repo.latest("c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_future_version_rejected() {
        let repo = InMemoryCheckpointRepository::new();
        let mut checkpoint = Checkpoint::new("s", state(1), Config::default());
        checkpoint.version = CHECKPOINT_VERSION + 1;
        let id = checkpoint.id;
        repo.insert_raw(checkpoint).await;

        assert!(matches!(
            repo.load(id).await,
            Err(DomainError::IncompatibleCheckpoint { .. })
        ));
    }
}
