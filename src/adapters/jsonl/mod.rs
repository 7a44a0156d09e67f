//! JSON-lines file adapters.

pub mod outcome_log;

pub use outcome_log::JsonlOutcomeLog;
