//! Durable snapshots of the orchestrator loop.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

use super::config::Config;
use super::outcome::Outcome;
use super::weights::WeightVector;

/// Schema version written into every new checkpoint.
pub const CHECKPOINT_VERSION: u32 = 1;

/// What happened in one completed iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub iteration: u64,
    pub task_category: String,
    pub candidate_id: String,
    pub outcome: Outcome,
    pub overall_score: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Resumable loop state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopState {
    pub iteration: u64,
    pub history: Vec<IterationSummary>,
    /// Last weight vector used per task category.
    pub weights: BTreeMap<String, WeightVector>,
}

impl LoopState {
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.history.last().map(|s| s.outcome)
    }
}

/// A versioned snapshot keyed by session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub session_id: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub state: LoopState,
    pub config: Config,
}

impl Checkpoint {
    pub fn new(session_id: impl Into<String>, state: LoopState, config: Config) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            version: CHECKPOINT_VERSION,
            created_at: Utc::now(),
            state,
            config,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Reject snapshots written by a newer schema than this build understands.
    pub const fn ensure_compatible(&self) -> DomainResult<()> {
        if self.version > CHECKPOINT_VERSION {
            return Err(DomainError::IncompatibleCheckpoint {
                id: self.id,
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_schema_is_rejected() {
        let mut checkpoint = Checkpoint::new("s", LoopState::default(), Config::default());
        assert!(checkpoint.ensure_compatible().is_ok());

        checkpoint.version = CHECKPOINT_VERSION + 1;
        assert!(matches!(
            checkpoint.ensure_compatible(),
            Err(DomainError::IncompatibleCheckpoint { found, .. }) if found == CHECKPOINT_VERSION + 1
        ));
    }

    #[test]
    fn test_checkpoint_survives_json() {
        let mut state = LoopState {
            iteration: 3,
            ..Default::default()
        };
        state.weights.insert("install".to_string(), WeightVector::uniform());
        let checkpoint = Checkpoint::new("s", state, Config::default());

        let json = serde_json::to_string(&checkpoint).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checkpoint);
    }
}
