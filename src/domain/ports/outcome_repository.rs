//! Outcome ledger port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CategoryStats, OutcomeFilter, OutcomeRecord};

/// Append-only ledger of past decisions and their results.
///
/// Records are never mutated or removed through this interface. A correction
/// is a new record whose `supersedes` field names the record it replaces.
/// Implementations must make a single `append` atomic; concurrent writers to
/// a shared file serialize their appends.
#[async_trait]
pub trait OutcomeRepository: Send + Sync {
    /// Durably append a record.
    ///
    /// A failure here must reach the caller: an unrecorded outcome is a lost
    /// learning signal.
    async fn append(&self, record: &OutcomeRecord) -> DomainResult<()>;

    /// Return matching records, oldest first.
    async fn query(&self, filter: &OutcomeFilter) -> DomainResult<Vec<OutcomeRecord>>;

    /// Aggregate statistics over the effective (non-superseded) records of a category.
    async fn stats(&self, task_category: &str) -> DomainResult<CategoryStats> {
        let records = self.query(&OutcomeFilter::category(task_category)).await?;
        Ok(CategoryStats::from_records(task_category, &records))
    }
}
