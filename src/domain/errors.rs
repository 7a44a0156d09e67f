//! Domain errors for the Helmsman decision core.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the decision core.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Invalid static configuration, or a structurally unusable input such as an empty path.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("No candidates supplied")]
    NoCandidates,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(Uuid),

    #[error("Incompatible checkpoint {id}: schema version {found}, supported up to {supported}")]
    IncompatibleCheckpoint { id: Uuid, found: u32, supported: u32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A collaborator (candidate source or tool executor) failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl DomainError {
    /// Whether the error ends the session rather than just the current iteration.
    pub const fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::CheckpointNotFound(_) | Self::IncompatibleCheckpoint { .. }
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_fatal_classification() {
        assert!(DomainError::Configuration("bad mode".into()).is_fatal_to_session());
        assert!(DomainError::CheckpointNotFound(Uuid::new_v4()).is_fatal_to_session());
        assert!(!DomainError::NoCandidates.is_fatal_to_session());
        assert!(!DomainError::InvalidWeights("sum".into()).is_fatal_to_session());
        assert!(!DomainError::Storage("disk full".into()).is_fatal_to_session());
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let err: DomainError = std::io::Error::other("broken pipe").into();
        assert!(matches!(err, DomainError::Storage(msg) if msg.contains("broken pipe")));
    }
}
