pub mod candidate;
pub mod checkpoint;
pub mod config;
pub mod diagnostic;
pub mod outcome;
pub mod progress;
pub mod task;
pub mod weights;

pub use candidate::{Candidate, Path, RiskFactor, StepDependency};
pub use checkpoint::{Checkpoint, IterationSummary, LoopState, CHECKPOINT_VERSION};
pub use config::{
    AggregationMode, CheckpointConfig, Config, DatabaseConfig, DecisionConfig, DiagnosticsConfig,
    LearningConfig, LoggingConfig, ProgressConfig,
};
pub use diagnostic::{DiagnosticContext, DiagnosticResult, DiagnosticVerdict};
pub use outcome::{
    effective_records, CategoryStats, Outcome, OutcomeFilter, OutcomeRecord, ScoreComponents,
};
pub use progress::{Heartbeat, ProgressSnapshot, StateChange, StateChangeKind};
pub use task::TaskContext;
pub use weights::{WeightVector, WEIGHT_FLOOR, WEIGHT_SUM_EPSILON};
