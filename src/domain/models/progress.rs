//! Liveness heartbeats and meaningful state transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness signal emitted once per loop pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub timestamp: DateTime<Utc>,
    pub iteration: u64,
    /// Loop phase at the time of the beat, e.g. `"evaluate"` or `"execute"`.
    pub phase: String,
}

impl Heartbeat {
    pub fn new(iteration: u64, phase: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            iteration,
            phase: phase.into(),
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Kinds of transition that count as real progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateChangeKind {
    ToolInvocation,
    DecisionMade,
    PlanProduced,
    OutcomeRecorded,
    CheckpointSaved,
}

impl StateChangeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToolInvocation => "tool_invocation",
            Self::DecisionMade => "decision_made",
            Self::PlanProduced => "plan_produced",
            Self::OutcomeRecorded => "outcome_recorded",
            Self::CheckpointSaved => "checkpoint_saved",
        }
    }
}

/// A meaningful transition recorded by the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub timestamp: DateTime<Utc>,
    pub kind: StateChangeKind,
    /// Short human-readable description, e.g. the chosen candidate id.
    pub payload: String,
}

impl StateChange {
    pub fn new(kind: StateChangeKind, payload: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            payload: payload.into(),
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Point-in-time copy of a tracker's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub heartbeats: Vec<Heartbeat>,
    pub state_changes: Vec<StateChange>,
    pub alive: bool,
    pub stuck: bool,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub last_state_change_at: Option<DateTime<Utc>>,
}
