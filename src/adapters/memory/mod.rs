//! In-process repositories for tests and embedding.

pub mod checkpoint_repository;
pub mod outcome_repository;

pub use checkpoint_repository::InMemoryCheckpointRepository;
pub use outcome_repository::InMemoryOutcomeRepository;
