//! Helmsman - decision and learning core for autonomous task agents
//!
//! Each iteration of an agent's control loop asks Helmsman which of several
//! candidate plans to pursue. Candidates are scored on four components
//! (effort, risk, alignment, confidence), ranked, and the best is chosen
//! with the lowest-ranked plan kept as fallback. Every execution is
//! appended to an outcome ledger, from which per-category weights are
//! learned. Heartbeats and state changes are tracked to tell slow work from
//! a stalled loop, and suspected stalls are handed to a diagnostic oracle in
//! the background. Loop state is checkpointed so a session can resume.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): evaluator, decision engine, learner,
//!   progress tracker, diagnostic dispatcher
//! - **Adapters** (`adapters`): SQLite, in-memory, JSONL and mock port
//!   implementations
//! - **Application Layer** (`application`): the orchestrator driving one loop
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use helmsman::adapters::memory::{InMemoryCheckpointRepository, InMemoryOutcomeRepository};
//! use helmsman::application::{Collaborators, Orchestrator};
//! use helmsman::domain::models::TaskContext;
//! use helmsman::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let collaborators = Collaborators {
//!         candidates: my_planner(),
//!         executor: my_executor(),
//!         oracle: my_oracle(),
//!         outcomes: Arc::new(InMemoryOutcomeRepository::new()),
//!         checkpoints: Arc::new(InMemoryCheckpointRepository::new()),
//!     };
//!     let mut orchestrator = Orchestrator::new("session-1", config, collaborators)?;
//!     let task = TaskContext::new("install the project dependencies", "install");
//!     let summary = orchestrator.run(task, 20).await?;
//!     println!("goal reached: {}", summary.goal_reached);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{Collaborators, IterationReport, Orchestrator, RunSummary};
pub use domain::models::{
    Candidate, Checkpoint, Config, DiagnosticResult, DiagnosticVerdict, Outcome, OutcomeFilter,
    OutcomeRecord, Path, TaskContext, WeightVector,
};
pub use domain::ports::{
    CandidateSource, CheckpointRepository, DiagnosticOracle, OutcomeRepository, ToolExecutor,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    DecisionEngine, DiagnosticDispatcher, PathEvaluator, ProgressTracker, WeightLearner,
};
