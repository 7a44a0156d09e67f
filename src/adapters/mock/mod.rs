//! Scriptable collaborators for tests and local experiments.

pub mod candidate_source;
pub mod diagnostic_oracle;
pub mod tool_executor;

pub use candidate_source::MockCandidateSource;
pub use diagnostic_oracle::MockDiagnosticOracle;
pub use tool_executor::MockToolExecutor;
