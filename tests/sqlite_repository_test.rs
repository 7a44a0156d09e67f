//! SQLite adapter integration tests: migrations, outcome ledger, checkpoints.

mod common;

use std::collections::BTreeMap;

use chrono::Utc;
use helmsman::adapters::sqlite::{
    create_migrated_test_pool, initialize_database, Migrator, SqliteCheckpointRepository,
    SqliteOutcomeRepository,
};
use helmsman::domain::models::{
    Config, DatabaseConfig, IterationSummary, LoopState, Outcome, OutcomeFilter, WeightVector,
};
use helmsman::domain::ports::{CheckpointRepository, OutcomeRepository};

use common::record;

fn loop_state(iterations: u64) -> LoopState {
    let history = (1..=iterations)
        .map(|iteration| IterationSummary {
            iteration,
            task_category: "install".to_string(),
            candidate_id: format!("candidate-{iteration}"),
            outcome: if iteration % 2 == 0 {
                Outcome::Failure
            } else {
                Outcome::Success
            },
            overall_score: 6.25,
            recorded_at: Utc::now(),
        })
        .collect();
    let mut weights = BTreeMap::new();
    weights.insert("install".to_string(), WeightVector::new(0.25, 0.35, 0.3, 0.1));
    LoopState {
        iteration: iterations,
        history,
        weights,
    }
}

#[tokio::test]
async fn test_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("ledger.db").to_string_lossy().into_owned(),
        max_connections: 2,
    };

    let first = record("install", Outcome::Success, WeightVector::default());
    {
        let pool = initialize_database(&config).await.unwrap();
        let repo = SqliteOutcomeRepository::new(pool.clone());
        repo.append(&first).await.unwrap();
        pool.close().await;
    }

    let pool = initialize_database(&config).await.unwrap();
    let version = Migrator::new(pool.clone()).get_current_version().await.unwrap();
    assert_eq!(version, 2);

    let records = SqliteOutcomeRepository::new(pool)
        .query(&OutcomeFilter::category("install"))
        .await
        .unwrap();
    assert_eq!(records, vec![first]);
}

#[tokio::test]
async fn test_query_filters_combine() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteOutcomeRepository::new(pool);

    for outcome in [Outcome::Success, Outcome::Failure, Outcome::Success, Outcome::Partial] {
        repo.append(&record("install", outcome, WeightVector::default()))
            .await
            .unwrap();
    }
    repo.append(&record("deploy", Outcome::Success, WeightVector::default()))
        .await
        .unwrap();

    let successes = repo
        .query(&OutcomeFilter::category("install").with_outcome(Outcome::Success))
        .await
        .unwrap();
    assert_eq!(successes.len(), 2);
    assert!(successes.iter().all(|r| r.task_category == "install"));

    let everything = repo.query(&OutcomeFilter::default()).await.unwrap();
    assert_eq!(everything.len(), 5);
    assert!(everything.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn test_stats_count_only_effective_records() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteOutcomeRepository::new(pool);

    let failed = record("install", Outcome::Failure, WeightVector::default());
    repo.append(&failed).await.unwrap();
    repo.append(&failed.superseded_by(Outcome::Success, None))
        .await
        .unwrap();
    repo.append(&record("install", Outcome::Success, WeightVector::default()))
        .await
        .unwrap();

    let stats = repo.stats("install").await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.successes, 2);
    assert_eq!(stats.failures, 0);
    assert!((stats.success_rate - 1.0).abs() < f64::EPSILON);

    // the raw ledger keeps the superseded record
    let raw = repo.query(&OutcomeFilter::category("install")).await.unwrap();
    assert_eq!(raw.len(), 3);
}

#[tokio::test]
async fn test_checkpoint_round_trip_is_deep_equal() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteCheckpointRepository::new(pool);
    let state = loop_state(4);
    let mut config = Config::default();
    config.learning.learning_rate = 0.25;
    config.progress.stuck_threshold = 7;

    let id = repo.save("session-a", &state, &config, None).await.unwrap();
    let loaded = repo.load(id).await.unwrap();

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.session_id, "session-a");
    assert_eq!(loaded.state, state);
    assert_eq!(loaded.config, config);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = SqliteCheckpointRepository::new(pool);

    repo.save("session-a", &loop_state(1), &Config::default(), None)
        .await
        .unwrap();
    let b = repo
        .save("session-b", &loop_state(2), &Config::default(), None)
        .await
        .unwrap();

    assert_eq!(repo.list("session-a").await.unwrap().len(), 1);
    let latest_b = repo.latest("session-b").await.unwrap().unwrap();
    assert_eq!(latest_b.id, b);
    assert_eq!(latest_b.state.iteration, 2);
    assert!(repo.latest("session-c").await.unwrap().is_none());
}
