//! Outcome ledger records and derived category statistics.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::weights::WeightVector;

/// Result of executing a chosen candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Partial,
}

impl Outcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Partial => "partial",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}

/// Per-criterion sub-scores on the 0-10 "higher is better" scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub effort: f64,
    pub risk: f64,
    pub alignment: f64,
    pub confidence: f64,
}

/// One immutable entry in the outcome ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub task_category: String,
    pub candidate_id: String,
    pub weights_used: WeightVector,
    pub score_components: ScoreComponents,
    pub overall_score: f64,
    pub outcome: Outcome,
    pub iterations_to_resolve: u32,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub failure_reason: Option<String>,
    /// Id of an earlier record this one corrects.
    #[serde(default)]
    pub supersedes: Option<Uuid>,
}

impl OutcomeRecord {
    /// Build a record stamped with a fresh id and the current time.
    pub fn new(
        task_category: impl Into<String>,
        candidate_id: impl Into<String>,
        weights_used: WeightVector,
        score_components: ScoreComponents,
        overall_score: f64,
        outcome: Outcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            task_category: task_category.into(),
            candidate_id: candidate_id.into(),
            weights_used,
            score_components,
            overall_score,
            outcome,
            iterations_to_resolve: 1,
            elapsed_ms: 0,
            failure_reason: None,
            supersedes: None,
        }
    }

    #[must_use]
    pub fn with_execution(mut self, iterations_to_resolve: u32, elapsed_ms: u64) -> Self {
        self.iterations_to_resolve = iterations_to_resolve;
        self.elapsed_ms = elapsed_ms;
        self
    }

    #[must_use]
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build a correction of `self`. The original stays in the ledger untouched.
    #[must_use]
    pub fn superseded_by(&self, outcome: Outcome, failure_reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            outcome,
            failure_reason,
            supersedes: Some(self.id),
            ..self.clone()
        }
    }
}

/// Drop records that a later record in the slice supersedes.
pub fn effective_records(records: &[OutcomeRecord]) -> Vec<&OutcomeRecord> {
    let superseded: HashSet<Uuid> = records.iter().filter_map(|r| r.supersedes).collect();
    records
        .iter()
        .filter(|r| !superseded.contains(&r.id))
        .collect()
}

/// Query filter for the outcome ledger. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeFilter {
    pub task_category: Option<String>,
    pub outcome: Option<Outcome>,
    pub since_timestamp: Option<DateTime<Utc>>,
    pub candidate_id: Option<String>,
    /// Keep only the most recent `limit` matches (still returned oldest first).
    pub limit: Option<usize>,
}

impl OutcomeFilter {
    pub fn category(task_category: impl Into<String>) -> Self {
        Self {
            task_category: Some(task_category.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn since(mut self, timestamp: DateTime<Utc>) -> Self {
        self.since_timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_candidate(mut self, candidate_id: impl Into<String>) -> Self {
        self.candidate_id = Some(candidate_id.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record passes every predicate (ignores `limit`).
    pub fn matches(&self, record: &OutcomeRecord) -> bool {
        self.task_category
            .as_ref()
            .is_none_or(|c| *c == record.task_category)
            && self.outcome.is_none_or(|o| o == record.outcome)
            && self.since_timestamp.is_none_or(|t| record.timestamp >= t)
            && self
                .candidate_id
                .as_ref()
                .is_none_or(|c| *c == record.candidate_id)
    }
}

/// Aggregate statistics for one task category.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    pub task_category: String,
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub partials: u64,
    pub success_rate: f64,
    pub avg_score: f64,
    pub avg_iterations: f64,
}

impl CategoryStats {
    /// Fold the effective records of `records` belonging to `task_category`.
    pub fn from_records(task_category: &str, records: &[OutcomeRecord]) -> Self {
        let mut stats = Self {
            task_category: task_category.to_string(),
            ..Default::default()
        };
        let mut score_sum = 0.0;
        let mut iteration_sum = 0.0;

        for record in effective_records(records)
            .into_iter()
            .filter(|r| r.task_category == task_category)
        {
            stats.total += 1;
            match record.outcome {
                Outcome::Success => stats.successes += 1,
                Outcome::Failure => stats.failures += 1,
                Outcome::Partial => stats.partials += 1,
            }
            score_sum += record.overall_score;
            iteration_sum += f64::from(record.iterations_to_resolve);
        }

        if stats.total > 0 {
            let n = stats.total as f64;
            stats.success_rate = stats.successes as f64 / n;
            stats.avg_score = score_sum / n;
            stats.avg_iterations = iteration_sum / n;
        }
        stats
    }
}
