//! Tool executor port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Candidate, Outcome, TaskContext};

/// Structured result of running a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub iterations_used: u32,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub failure_reason: Option<String>,
    /// Opaque artifact references produced by the run.
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Executor-reported partial completion; only meaningful when `success` is false.
    #[serde(default)]
    pub partial: bool,
    /// Executor reports the overall task as finished.
    #[serde(default)]
    pub goal_reached: bool,
}

impl ExecutionResult {
    pub fn succeeded(iterations_used: u32, elapsed_ms: u64) -> Self {
        Self {
            success: true,
            iterations_used,
            elapsed_ms,
            ..Default::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            iterations_used: 1,
            failure_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.success {
            Outcome::Success
        } else if self.partial {
            Outcome::Partial
        } else {
            Outcome::Failure
        }
    }
}

/// Runs side-effecting operations for a chosen candidate.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, candidate: &Candidate, task: &TaskContext) -> DomainResult<ExecutionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(ExecutionResult::succeeded(1, 10).outcome(), Outcome::Success);
        assert_eq!(ExecutionResult::failed("boom").outcome(), Outcome::Failure);

        let partial = ExecutionResult {
            partial: true,
            ..ExecutionResult::failed("half done")
        };
        assert_eq!(partial.outcome(), Outcome::Partial);
    }
}
