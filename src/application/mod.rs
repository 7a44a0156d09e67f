//! Application layer: wires services and adapters into the decision loop.

pub mod orchestrator;

pub use orchestrator::{Collaborators, IterationReport, Orchestrator, RunSummary};
