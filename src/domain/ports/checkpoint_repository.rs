//! Checkpoint store port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Checkpoint, Config, LoopState};

/// Durable snapshot/restore of orchestrator state.
///
/// Later checkpoints for a session supersede earlier ones without deleting
/// them. Sessions are independent; no cross-session coordination is needed.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Persist a snapshot and return its id.
    ///
    /// When `checkpoint_id` is given and already exists, that checkpoint is
    /// overwritten; otherwise a fresh id is generated.
    async fn save(
        &self,
        session_id: &str,
        state: &LoopState,
        config: &Config,
        checkpoint_id: Option<Uuid>,
    ) -> DomainResult<Uuid>;

    /// Load a checkpoint by id.
    ///
    /// Fails with `CheckpointNotFound` when absent and with
    /// `IncompatibleCheckpoint` when written by a newer schema.
    async fn load(&self, checkpoint_id: Uuid) -> DomainResult<Checkpoint>;

    /// The most recent checkpoint of a session, if any.
    async fn latest(&self, session_id: &str) -> DomainResult<Option<Checkpoint>>;

    /// Every checkpoint of a session, oldest first.
    async fn list(&self, session_id: &str) -> DomainResult<Vec<Checkpoint>>;
}
