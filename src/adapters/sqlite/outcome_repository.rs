//! SQLite implementation of the outcome ledger.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CategoryStats, Outcome, OutcomeFilter, OutcomeRecord};
use crate::domain::ports::OutcomeRepository;

const COLUMNS: &str = "id, timestamp, task_category, candidate_id, weights_used, score_components, overall_score, outcome, iterations_to_resolve, elapsed_ms, failure_reason, supersedes";

#[derive(Clone)]
pub struct SqliteOutcomeRepository {
    pool: SqlitePool,
}

impl SqliteOutcomeRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutcomeRepository for SqliteOutcomeRepository {
    async fn append(&self, record: &OutcomeRecord) -> DomainResult<()> {
        let weights_json = serde_json::to_string(&record.weights_used)?;
        let components_json = serde_json::to_string(&record.score_components)?;

        sqlx::query(&format!(
            "INSERT INTO outcome_records ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(record.id.to_string())
        .bind(format_datetime(&record.timestamp))
        .bind(&record.task_category)
        .bind(&record.candidate_id)
        .bind(&weights_json)
        .bind(&components_json)
        .bind(record.overall_score)
        .bind(record.outcome.as_str())
        .bind(i64::from(record.iterations_to_resolve))
        .bind(i64::try_from(record.elapsed_ms).unwrap_or(i64::MAX))
        .bind(&record.failure_reason)
        .bind(record.supersedes.map(|id| id.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(&self, filter: &OutcomeFilter) -> DomainResult<Vec<OutcomeRecord>> {
        let mut inner = format!("SELECT rowid AS seq, {COLUMNS} FROM outcome_records WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(category) = &filter.task_category {
            inner.push_str(" AND task_category = ?");
            bindings.push(category.clone());
        }
        if let Some(outcome) = filter.outcome {
            inner.push_str(" AND outcome = ?");
            bindings.push(outcome.as_str().to_string());
        }
        if let Some(since) = &filter.since_timestamp {
            inner.push_str(" AND timestamp >= ?");
            bindings.push(format_datetime(since));
        }
        if let Some(candidate) = &filter.candidate_id {
            inner.push_str(" AND candidate_id = ?");
            bindings.push(candidate.clone());
        }

        // Newest-first inside so LIMIT keeps the most recent rows, then flip.
        inner.push_str(" ORDER BY timestamp DESC, seq DESC");
        if let Some(limit) = filter.limit {
            inner.push_str(&format!(" LIMIT {limit}"));
        }
        let query = format!("SELECT * FROM ({inner}) ORDER BY timestamp ASC, seq ASC");

        let mut q = sqlx::query_as::<_, OutcomeRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<OutcomeRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn stats(&self, task_category: &str) -> DomainResult<CategoryStats> {
        let (total, successes, failures, partials, avg_score, avg_iterations): (i64, i64, i64, i64, f64, f64) =
            sqlx::query_as(
                r"SELECT COUNT(*),
                         COALESCE(SUM(CASE WHEN outcome = 'success' THEN 1 ELSE 0 END), 0),
                         COALESCE(SUM(CASE WHEN outcome = 'failure' THEN 1 ELSE 0 END), 0),
                         COALESCE(SUM(CASE WHEN outcome = 'partial' THEN 1 ELSE 0 END), 0),
                         COALESCE(AVG(overall_score), 0.0),
                         COALESCE(AVG(CAST(iterations_to_resolve AS REAL)), 0.0)
                  FROM outcome_records
                  WHERE task_category = ?
                    AND id NOT IN (SELECT supersedes FROM outcome_records WHERE supersedes IS NOT NULL)",
            )
            .bind(task_category)
            .fetch_one(&self.pool)
            .await?;

        let to_count = |n: i64| u64::try_from(n).unwrap_or(0);
        let total = to_count(total);
        let successes = to_count(successes);
        Ok(CategoryStats {
            task_category: task_category.to_string(),
            total,
            successes,
            failures: to_count(failures),
            partials: to_count(partials),
            success_rate: if total == 0 { 0.0 } else { successes as f64 / total as f64 },
            avg_score,
            avg_iterations,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    id: String,
    timestamp: String,
    task_category: String,
    candidate_id: String,
    weights_used: String,
    score_components: String,
    overall_score: f64,
    outcome: String,
    iterations_to_resolve: i64,
    elapsed_ms: i64,
    failure_reason: Option<String>,
    supersedes: Option<String>,
}

impl TryFrom<OutcomeRow> for OutcomeRecord {
    type Error = DomainError;

    fn try_from(row: OutcomeRow) -> Result<Self, Self::Error> {
        let outcome = Outcome::parse_str(&row.outcome)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid outcome: {}", row.outcome)))?;

        Ok(Self {
            id: parse_uuid(&row.id)?,
            timestamp: parse_datetime(&row.timestamp)?,
            task_category: row.task_category,
            candidate_id: row.candidate_id,
            weights_used: serde_json::from_str(&row.weights_used)?,
            score_components: serde_json::from_str(&row.score_components)?,
            overall_score: row.overall_score,
            outcome,
            iterations_to_resolve: u32::try_from(row.iterations_to_resolve).unwrap_or(u32::MAX),
            elapsed_ms: u64::try_from(row.elapsed_ms).unwrap_or(0),
            failure_reason: row.failure_reason,
            supersedes: parse_optional_uuid(row.supersedes)?,
        })
    }
}
