//! Liveness diagnostic requests and verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::progress::{Heartbeat, StateChange};

/// Classification returned by the diagnostic oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticVerdict {
    MakingProgress,
    StuckInLoop,
    BlockedOnExternalResource,
    Failed,
}

impl DiagnosticVerdict {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MakingProgress => "making_progress",
            Self::StuckInLoop => "stuck_in_loop",
            Self::BlockedOnExternalResource => "blocked_on_external_resource",
            Self::Failed => "failed",
        }
    }

    /// Whether the loop should change course.
    pub const fn requires_intervention(&self) -> bool {
        !matches!(self, Self::MakingProgress)
    }
}

/// Evidence handed to the oracle when a check starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticContext {
    pub session_id: String,
    pub iteration: u64,
    pub task_description: String,
    pub recent_heartbeats: Vec<Heartbeat>,
    pub recent_state_changes: Vec<StateChange>,
}

/// Completed diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub check_id: String,
    pub verdict: DiagnosticVerdict,
    #[serde(default)]
    pub explanation: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl DiagnosticResult {
    pub fn new(check_id: impl Into<String>, verdict: DiagnosticVerdict) -> Self {
        Self {
            check_id: check_id.into(),
            verdict,
            explanation: None,
            completed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}
