//! Core decision, learning and monitoring services.

pub mod decision_engine;
pub mod diagnostic_dispatcher;
pub mod path_evaluator;
pub mod progress_tracker;
pub mod weight_learner;

pub use decision_engine::{Choice, DecisionEngine, RankedEntry, RankedList};
pub use diagnostic_dispatcher::DiagnosticDispatcher;
pub use path_evaluator::{PathEvaluator, PathScoreInputs};
pub use progress_tracker::ProgressTracker;
pub use weight_learner::{blend_ratio, derive_weights, LearnedWeights, WeightLearner};
