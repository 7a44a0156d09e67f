//! Candidate alternatives and multi-step paths.
//!
//! Candidates are produced fresh every iteration by the candidate source and
//! are never mutated afterwards. A [`Path`] is an ordered lookahead over
//! candidates; its aggregate attributes are derived by the path evaluator
//! rather than stored.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A named risk attached to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    /// Probability the risk materializes (0-1).
    pub likelihood: f64,
    /// Damage if it does (0-10).
    pub impact: f64,
}

impl RiskFactor {
    pub fn new(name: impl Into<String>, likelihood: f64, impact: f64) -> Self {
        Self {
            name: name.into(),
            likelihood,
            impact,
        }
    }

    /// Expected impact: `likelihood * impact`.
    pub fn exposure(&self) -> f64 {
        self.likelihood.clamp(0.0, 1.0) * self.impact.clamp(0.0, 10.0)
    }
}

/// One option for accomplishing the next step of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Candidate {
    pub id: String,
    pub label: String,
    /// Self-reported effort (0-10).
    pub estimated_effort: f64,
    /// Self-reported risk (0-10).
    pub estimated_risk: f64,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    /// Self-reported confidence (0-1).
    pub confidence: f64,
    /// How well the option serves the overall goal (0-1).
    pub alignment_score: f64,
    /// Intrinsic complexity (0-10). Falls back to `estimated_effort` when absent.
    #[serde(default)]
    pub complexity: Option<f64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Candidate {
    /// Create a candidate with neutral mid-scale attributes.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            estimated_effort: 5.0,
            estimated_risk: 5.0,
            risk_factors: Vec::new(),
            confidence: 0.5,
            alignment_score: 0.5,
            complexity: None,
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_effort(mut self, effort: f64) -> Self {
        self.estimated_effort = effort;
        self
    }

    #[must_use]
    pub fn with_risk(mut self, risk: f64) -> Self {
        self.estimated_risk = risk;
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: f64) -> Self {
        self.alignment_score = alignment;
        self
    }

    #[must_use]
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = Some(complexity);
        self
    }

    #[must_use]
    pub fn with_risk_factor(mut self, factor: RiskFactor) -> Self {
        self.risk_factors.push(factor);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Complexity used for path compounding.
    pub fn effective_complexity(&self) -> f64 {
        self.complexity.unwrap_or(self.estimated_effort)
    }

    /// The risk factor with the highest exposure, if any were declared.
    pub fn dominant_risk_factor(&self) -> Option<&RiskFactor> {
        self.risk_factors
            .iter()
            .max_by(|a, b| a.exposure().total_cmp(&b.exposure()))
    }
}

/// Ordering hint from the candidate source: `prerequisite` must run before `dependent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDependency {
    pub prerequisite: String,
    pub dependent: String,
}

impl StepDependency {
    pub fn new(prerequisite: impl Into<String>, dependent: impl Into<String>) -> Self {
        Self {
            prerequisite: prerequisite.into(),
            dependent: dependent.into(),
        }
    }
}

/// An ordered multi-step lookahead over candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub steps: Vec<Candidate>,
    /// Ordering constraints declared by the candidate source, if any.
    #[serde(default)]
    pub dependencies: Vec<StepDependency>,
}

impl Path {
    pub const fn new(steps: Vec<Candidate>) -> Self {
        Self {
            steps,
            dependencies: Vec::new(),
        }
    }

    /// A one-step path wrapping a single candidate.
    pub fn single(candidate: Candidate) -> Self {
        Self::new(vec![candidate])
    }

    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<StepDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn first_step(&self) -> Option<&Candidate> {
        self.steps.first()
    }

    pub fn last_step(&self) -> Option<&Candidate> {
        self.steps.last()
    }

    /// Stable identifier built from the step ids, e.g. `fetch>build>test`.
    pub fn id(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(">")
    }
}

impl From<Candidate> for Path {
    fn from(candidate: Candidate) -> Self {
        Self::single(candidate)
    }
}
