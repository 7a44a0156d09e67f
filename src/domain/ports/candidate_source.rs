//! Candidate source port.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, Path, StepDependency, TaskContext};

/// What the candidate source offers for one iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub candidates: Vec<Candidate>,
    /// Optional multi-step lookaheads, as sequences of candidate ids.
    #[serde(default)]
    pub paths: Vec<Vec<String>>,
    /// Optional ordering hints applied to every path.
    #[serde(default)]
    pub dependencies: Vec<StepDependency>,
}

impl Proposal {
    pub const fn from_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            paths: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Resolve into evaluable paths.
    ///
    /// Without explicit paths every candidate becomes a one-step path. A path
    /// with no steps, or naming an unknown candidate id, is rejected as
    /// `InvalidPath`.
    pub fn into_paths(self) -> DomainResult<Vec<Path>> {
        if self.candidates.is_empty() {
            return Err(DomainError::NoCandidates);
        }
        if self.paths.is_empty() {
            return Ok(self
                .candidates
                .into_iter()
                .map(|c| Path::single(c).with_dependencies(self.dependencies.clone()))
                .collect());
        }

        let by_id: HashMap<&str, &Candidate> =
            self.candidates.iter().map(|c| (c.id.as_str(), c)).collect();

        self.paths
            .iter()
            .map(|ids| {
                if ids.is_empty() {
                    return Err(DomainError::InvalidPath("proposed path has no steps".into()));
                }
                let steps = ids
                    .iter()
                    .map(|id| {
                        by_id.get(id.as_str()).map(|c| (*c).clone()).ok_or_else(|| {
                            DomainError::InvalidPath(format!("unknown candidate id '{id}'"))
                        })
                    })
                    .collect::<DomainResult<Vec<_>>>()?;
                Ok(Path::new(steps).with_dependencies(self.dependencies.clone()))
            })
            .collect()
    }
}

/// Supplier of diverse candidate alternatives.
///
/// May be a human, a heuristic generator or a reasoning oracle; only the
/// output shape is constrained.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn propose(&self, task: &TaskContext) -> DomainResult<Proposal>;
}
