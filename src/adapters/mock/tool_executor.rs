//! Mock tool executor.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, TaskContext};
use crate::domain::ports::{ExecutionResult, ToolExecutor};

/// Executor returning scripted results per candidate id.
///
/// Lookup order: the candidate's queued results, then its fixed result,
/// then the default.
pub struct MockToolExecutor {
    default_result: ExecutionResult,
    fixed: HashMap<String, ExecutionResult>,
    queued: Arc<RwLock<HashMap<String, VecDeque<ExecutionResult>>>>,
    fail_with: Option<String>,
    executed: Arc<RwLock<Vec<String>>>,
}

impl Default for MockToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockToolExecutor {
    /// Executor where every candidate succeeds in one iteration.
    pub fn new() -> Self {
        Self::with_default(ExecutionResult::succeeded(1, 10))
    }

    pub fn with_default(default_result: ExecutionResult) -> Self {
        Self {
            default_result,
            fixed: HashMap::new(),
            queued: Arc::new(RwLock::new(HashMap::new())),
            fail_with: None,
            executed: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every call errors, as a crashed tool runner would.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_result(mut self, candidate_id: impl Into<String>, result: ExecutionResult) -> Self {
        self.fixed.insert(candidate_id.into(), result);
        self
    }

    /// Queue a one-shot result for the next run of `candidate_id`.
    pub async fn enqueue(&self, candidate_id: impl Into<String>, result: ExecutionResult) {
        self.queued
            .write()
            .await
            .entry(candidate_id.into())
            .or_default()
            .push_back(result);
    }

    /// Candidate ids executed so far, in call order.
    pub async fn executed(&self) -> Vec<String> {
        self.executed.read().await.clone()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    async fn execute(&self, candidate: &Candidate, _task: &TaskContext) -> DomainResult<ExecutionResult> {
        self.executed.write().await.push(candidate.id.clone());
        if let Some(reason) = &self.fail_with {
            return Err(DomainError::ExecutionFailed(reason.clone()));
        }

        let queued = self
            .queued
            .write()
            .await
            .get_mut(&candidate.id)
            .and_then(VecDeque::pop_front);
        if let Some(result) = queued {
            return Ok(result);
        }
        Ok(self
            .fixed
            .get(&candidate.id)
            .cloned()
            .unwrap_or_else(|| self.default_result.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Outcome;

    #[tokio::test]
    async fn test_lookup_order() {
        let executor = MockToolExecutor::new().with_result("flaky", ExecutionResult::failed("timeout"));
        executor
            .enqueue("flaky", ExecutionResult::succeeded(2, 100))
            .await;
        let task = TaskContext::new("t", "cat");
        let flaky = Candidate::new("flaky", "Flaky");

        assert_eq!(executor.execute(&flaky, &task).await.unwrap().outcome(), Outcome::Success);
        assert_eq!(executor.execute(&flaky, &task).await.unwrap().outcome(), Outcome::Failure);
        assert_eq!(
            executor
                .execute(&Candidate::new("other", "Other"), &task)
                .await
                .unwrap()
                .outcome(),
            Outcome::Success
        );
        assert_eq!(executor.executed().await, vec!["flaky", "flaky", "other"]);
    }
}
