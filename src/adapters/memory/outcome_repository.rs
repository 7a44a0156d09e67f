//! In-memory outcome ledger.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{OutcomeFilter, OutcomeRecord};
use crate::domain::ports::OutcomeRepository;

/// Vector-backed ledger. Appends happen under a write lock, so each one is atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutcomeRepository {
    records: Arc<RwLock<Vec<OutcomeRecord>>>,
}

impl InMemoryOutcomeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Apply `filter` to records already in append order.
pub(crate) fn select(records: &[OutcomeRecord], filter: &OutcomeFilter) -> Vec<OutcomeRecord> {
    let mut matching: Vec<OutcomeRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    matching.sort_by_key(|r| r.timestamp);
    if let Some(limit) = filter.limit {
        let skip = matching.len().saturating_sub(limit);
        matching = matching.split_off(skip);
    }
    matching
}

#[async_trait]
impl OutcomeRepository for InMemoryOutcomeRepository {
    async fn append(&self, record: &OutcomeRecord) -> DomainResult<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(DomainError::Storage(format!(
                "outcome record {} already exists",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn query(&self, filter: &OutcomeFilter) -> DomainResult<Vec<OutcomeRecord>> {
        Ok(select(&self.records.read().await, filter))
    }
}
