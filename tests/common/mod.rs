//! Common test utilities for integration tests
//!
//! Provides shared fixtures and collaborator wiring used across multiple
//! integration test files.

use std::sync::Arc;

use helmsman::adapters::memory::{InMemoryCheckpointRepository, InMemoryOutcomeRepository};
use helmsman::adapters::mock::{MockCandidateSource, MockDiagnosticOracle, MockToolExecutor};
use helmsman::application::Collaborators;
use helmsman::domain::models::{
    Candidate, DiagnosticVerdict, Outcome, OutcomeRecord, ScoreComponents, WeightVector,
};

/// Setup test logging
///
/// Initializes a tracing subscriber that writes through the test harness.
#[allow(dead_code)]
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Candidate with every scoring attribute set.
#[allow(dead_code)]
pub fn candidate(id: &str, effort: f64, risk: f64, alignment: f64, confidence: f64) -> Candidate {
    Candidate::new(id, format!("candidate {id}"))
        .with_effort(effort)
        .with_risk(risk)
        .with_alignment(alignment)
        .with_confidence(confidence)
}

/// Ledger record for `category` produced under `weights`.
#[allow(dead_code)]
pub fn record(category: &str, outcome: Outcome, weights: WeightVector) -> OutcomeRecord {
    OutcomeRecord::new(
        category,
        "candidate",
        weights,
        ScoreComponents::default(),
        6.0,
        outcome,
    )
}

/// Handles kept by a test next to the collaborators handed to the orchestrator.
#[allow(dead_code)]
pub struct Harness {
    pub source: Arc<MockCandidateSource>,
    pub executor: Arc<MockToolExecutor>,
    pub oracle: Arc<MockDiagnosticOracle>,
    pub outcomes: Arc<InMemoryOutcomeRepository>,
    pub checkpoints: Arc<InMemoryCheckpointRepository>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(source: MockCandidateSource, executor: MockToolExecutor) -> Self {
        Self {
            source: Arc::new(source),
            executor: Arc::new(executor),
            oracle: Arc::new(MockDiagnosticOracle::new(DiagnosticVerdict::StuckInLoop)),
            outcomes: Arc::new(InMemoryOutcomeRepository::new()),
            checkpoints: Arc::new(InMemoryCheckpointRepository::new()),
        }
    }

    pub fn with_oracle(mut self, oracle: MockDiagnosticOracle) -> Self {
        self.oracle = Arc::new(oracle);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            candidates: self.source.clone(),
            executor: self.executor.clone(),
            oracle: self.oracle.clone(),
            outcomes: self.outcomes.clone(),
            checkpoints: self.checkpoints.clone(),
        }
    }
}
