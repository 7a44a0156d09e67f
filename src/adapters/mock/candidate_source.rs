//! Mock candidate source.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, TaskContext};
use crate::domain::ports::{CandidateSource, Proposal};

/// Candidate source that replays scripted proposals.
///
/// Queued proposals are handed out one per call; once the queue is drained
/// every call returns the default proposal.
pub struct MockCandidateSource {
    queued: Arc<RwLock<VecDeque<Proposal>>>,
    default_proposal: Proposal,
    fail_with: Option<String>,
    seen_tasks: Arc<RwLock<Vec<TaskContext>>>,
}

impl MockCandidateSource {
    pub fn new(default_proposal: Proposal) -> Self {
        Self {
            queued: Arc::new(RwLock::new(VecDeque::new())),
            default_proposal,
            fail_with: None,
            seen_tasks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Always propose the same candidates as one-step paths.
    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        Self::new(Proposal::from_candidates(candidates))
    }

    /// Every call fails, as an unreachable source would.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new(Proposal::default())
        }
    }

    pub async fn enqueue(&self, proposal: Proposal) {
        self.queued.write().await.push_back(proposal);
    }

    /// Task contexts received so far, in call order.
    pub async fn seen_tasks(&self) -> Vec<TaskContext> {
        self.seen_tasks.read().await.clone()
    }
}

#[async_trait]
impl CandidateSource for MockCandidateSource {
    async fn propose(&self, task: &TaskContext) -> DomainResult<Proposal> {
        self.seen_tasks.write().await.push(task.clone());
        if let Some(reason) = &self.fail_with {
            return Err(DomainError::ExecutionFailed(reason.clone()));
        }
        let next = self.queued.write().await.pop_front();
        Ok(next.unwrap_or_else(|| self.default_proposal.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_default() {
        let source = MockCandidateSource::with_candidates(vec![Candidate::new("default", "D")]);
        source
            .enqueue(Proposal::from_candidates(vec![Candidate::new("first", "F")]))
            .await;
        let task = TaskContext::new("t", "cat");

        let first = source.propose(&task).await.unwrap();
        assert_eq!(first.candidates[0].id, "first");
        let second = source.propose(&task).await.unwrap();
        assert_eq!(second.candidates[0].id, "default");
        assert_eq!(source.seen_tasks().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = MockCandidateSource::failing("oracle offline");
        let result = source.propose(&TaskContext::new("t", "cat")).await;
        assert!(matches!(result, Err(DomainError::ExecutionFailed(_))));
    }
}
