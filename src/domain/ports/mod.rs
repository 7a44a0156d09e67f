//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - OutcomeRepository: append-only outcome ledger
//! - CheckpointRepository: durable loop snapshots
//! - CandidateSource: produces alternatives for the next step
//! - ToolExecutor: runs a chosen alternative
//! - DiagnosticOracle: classifies a suspected stall
//!
//! These traits keep the decision core independent of storage backends and
//! of the collaborators that generate and execute candidates.

pub mod candidate_source;
pub mod checkpoint_repository;
pub mod diagnostic_oracle;
pub mod outcome_repository;
pub mod tool_executor;

pub use candidate_source::{CandidateSource, Proposal};
pub use checkpoint_repository::CheckpointRepository;
pub use diagnostic_oracle::DiagnosticOracle;
pub use outcome_repository::OutcomeRepository;
pub use tool_executor::{ExecutionResult, ToolExecutor};
