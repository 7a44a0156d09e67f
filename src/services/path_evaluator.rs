//! Path evaluation: folds a multi-step lookahead into scalar scoring inputs.
//!
//! Aggregation rules:
//! - effort is additive across steps
//! - risk follows the configured [`AggregationMode`] (weakest link by default)
//! - complexity compounds with step count to model coordination overhead
//! - confidence multiplies, so one shaky step drags the whole path down
//! - only the final step's alignment counts; earlier steps are instrumental

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AggregationMode, DecisionConfig, Path};

/// Aggregated attributes of a path, ready for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathScoreInputs {
    pub path_id: String,
    pub step_count: usize,
    pub total_effort: f64,
    pub aggregate_risk: f64,
    pub compound_complexity: f64,
    pub path_confidence: f64,
    pub terminal_alignment: f64,
}

/// Pure evaluator for [`Path`]s.
#[derive(Debug, Clone)]
pub struct PathEvaluator {
    config: DecisionConfig,
}

impl PathEvaluator {
    /// Create an evaluator, failing fast on unusable knobs.
    pub fn new(config: DecisionConfig) -> DomainResult<Self> {
        if !config.compound_factor.is_finite() || config.compound_factor < 0.0 {
            return Err(DomainError::Configuration(format!(
                "compound_factor must be a non-negative number, got {}",
                config.compound_factor
            )));
        }
        if !(config.recency_decay > 0.0 && config.recency_decay <= 1.0) {
            return Err(DomainError::Configuration(format!(
                "recency_decay must be in (0, 1], got {}",
                config.recency_decay
            )));
        }
        Ok(Self { config })
    }

    pub const fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Evaluate a path. Same path and config always yield the same output.
    pub fn evaluate(&self, path: &Path) -> DomainResult<PathScoreInputs> {
        let (Some(first), Some(last)) = (path.first_step(), path.last_step()) else {
            return Err(DomainError::Configuration(
                "cannot evaluate an empty path".to_string(),
            ));
        };
        Self::check_finite(path)?;
        Self::check_ordering(path)?;

        let step_count = path.step_count();
        let risks: Vec<f64> = path.steps.iter().map(|s| s.estimated_risk).collect();

        let compound_complexity = first.effective_complexity()
            * (step_count as f64 - 1.0).mul_add(self.config.compound_factor, 1.0);

        Ok(PathScoreInputs {
            path_id: path.id(),
            step_count,
            total_effort: path.steps.iter().map(|s| s.estimated_effort).sum(),
            aggregate_risk: self.aggregate_risk(&risks),
            compound_complexity,
            path_confidence: path.steps.iter().map(|s| s.confidence).product(),
            terminal_alignment: last.alignment_score,
        })
    }

    fn aggregate_risk(&self, risks: &[f64]) -> f64 {
        match self.config.aggregation {
            AggregationMode::Max => risks.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregationMode::Average => risks.iter().sum::<f64>() / risks.len() as f64,
            AggregationMode::Weighted => {
                let n = risks.len();
                let (weighted, total_weight) = risks.iter().enumerate().fold(
                    (0.0, 0.0),
                    |(acc, weight_sum), (i, risk)| {
                        let distance = i32::try_from(n - 1 - i).unwrap_or(i32::MAX);
                        let weight = self.config.recency_decay.powi(distance);
                        (risk.mul_add(weight, acc), weight_sum + weight)
                    },
                );
                weighted / total_weight
            }
        }
    }

    /// Reject steps whose attributes are NaN or infinite.
    fn check_finite(path: &Path) -> DomainResult<()> {
        for step in &path.steps {
            let attributes = [
                ("estimated_effort", step.estimated_effort),
                ("estimated_risk", step.estimated_risk),
                ("confidence", step.confidence),
                ("alignment_score", step.alignment_score),
                ("complexity", step.complexity.unwrap_or(0.0)),
            ];
            if let Some((name, value)) = attributes.iter().find(|(_, v)| !v.is_finite()) {
                return Err(DomainError::InvalidPath(format!(
                    "step '{}' has non-finite {name}: {value}",
                    step.id
                )));
            }
        }
        Ok(())
    }

    /// Reject repeated steps and steps that violate a declared dependency.
    fn check_ordering(path: &Path) -> DomainResult<()> {
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(path.step_count());
        for (index, step) in path.steps.iter().enumerate() {
            if positions.insert(step.id.as_str(), index).is_some() {
                return Err(DomainError::InvalidPath(format!(
                    "step '{}' appears more than once in path {}",
                    step.id,
                    path.id()
                )));
            }
        }

        for dep in &path.dependencies {
            if let (Some(pre), Some(post)) = (
                positions.get(dep.prerequisite.as_str()),
                positions.get(dep.dependent.as_str()),
            ) {
                if pre > post {
                    return Err(DomainError::InvalidPath(format!(
                        "'{}' must run before '{}' in path {}",
                        dep.prerequisite,
                        dep.dependent,
                        path.id()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Candidate, StepDependency};

    fn step(id: &str, effort: f64, risk: f64, confidence: f64, alignment: f64) -> Candidate {
        Candidate::new(id, id)
            .with_effort(effort)
            .with_risk(risk)
            .with_confidence(confidence)
            .with_alignment(alignment)
    }

    fn evaluator(mode: AggregationMode) -> PathEvaluator {
        PathEvaluator::new(DecisionConfig {
            aggregation: mode,
            ..Default::default()
        })
        .unwrap()
    }

    fn three_steps() -> Path {
        Path::new(vec![
            step("a", 2.0, 2.0, 0.9, 0.2),
            step("b", 3.0, 8.0, 0.5, 0.4),
            step("c", 1.0, 4.0, 0.8, 0.9),
        ])
    }

    #[test]
    fn test_aggregates_three_step_path() {
        let inputs = evaluator(AggregationMode::Max).evaluate(&three_steps()).unwrap();

        assert_eq!(inputs.step_count, 3);
        assert!((inputs.total_effort - 6.0).abs() < 1e-12);
        assert!((inputs.aggregate_risk - 8.0).abs() < 1e-12);
        assert!((inputs.path_confidence - 0.36).abs() < 1e-12);
        assert!((inputs.terminal_alignment - 0.9).abs() < 1e-12);
        // base complexity = first step effort (2.0), inflated by (1 + 2 * 0.2)
        assert!((inputs.compound_complexity - 2.8).abs() < 1e-12);
        assert_eq!(inputs.path_id, "a>b>c");
    }

    #[test]
    fn test_average_risk() {
        let inputs = evaluator(AggregationMode::Average)
            .evaluate(&three_steps())
            .unwrap();
        assert!((inputs.aggregate_risk - 14.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_risk_favours_later_steps() {
        let inputs = evaluator(AggregationMode::Weighted)
            .evaluate(&three_steps())
            .unwrap();
        // weights 0.25, 0.5, 1.0 for steps a, b, c
        let expected = 2.0f64.mul_add(0.25, 8.0f64.mul_add(0.5, 4.0)) / 1.75;
        assert!((inputs.aggregate_risk - expected).abs() < 1e-12);
    }

    #[test]
    fn test_single_step_path_uses_candidate_values() {
        let path = Path::single(step("only", 4.0, 6.0, 0.7, 0.6).with_complexity(3.0));
        let inputs = evaluator(AggregationMode::Weighted).evaluate(&path).unwrap();
        assert!((inputs.total_effort - 4.0).abs() < 1e-12);
        assert!((inputs.aggregate_risk - 6.0).abs() < 1e-12);
        assert!((inputs.compound_complexity - 3.0).abs() < 1e-12);
        assert!((inputs.path_confidence - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_empty_path_is_configuration_error() {
        let result = evaluator(AggregationMode::Max).evaluate(&Path::new(vec![]));
        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_dependency_violation_is_invalid_path() {
        let path = three_steps().with_dependencies(vec![StepDependency::new("c", "a")]);
        let result = evaluator(AggregationMode::Max).evaluate(&path);
        assert!(matches!(result, Err(DomainError::InvalidPath(_))));
    }

    #[test]
    fn test_satisfied_dependency_and_absent_prerequisite_are_accepted() {
        let path = three_steps().with_dependencies(vec![
            StepDependency::new("a", "c"),
            StepDependency::new("setup", "b"),
        ]);
        assert!(evaluator(AggregationMode::Max).evaluate(&path).is_ok());
    }

    #[test]
    fn test_repeated_step_is_invalid_path() {
        let path = Path::new(vec![step("a", 1.0, 1.0, 1.0, 1.0), step("a", 1.0, 1.0, 1.0, 1.0)]);
        assert!(matches!(
            evaluator(AggregationMode::Max).evaluate(&path),
            Err(DomainError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_non_finite_attributes_are_invalid_path() {
        let evaluator = evaluator(AggregationMode::Max);
        let cases = [
            step("x", f64::NAN, 1.0, 0.5, 0.5),
            step("x", 1.0, f64::INFINITY, 0.5, 0.5),
            step("x", 1.0, 1.0, f64::NAN, 0.5),
            step("x", 1.0, 1.0, 0.5, f64::NEG_INFINITY),
            step("x", 1.0, 1.0, 0.5, 0.5).with_complexity(f64::NAN),
        ];
        for candidate in cases {
            let result = evaluator.evaluate(&Path::single(candidate));
            assert!(matches!(result, Err(DomainError::InvalidPath(msg)) if msg.contains("non-finite")));
        }
    }

    #[test]
    fn test_rejects_bad_recency_decay() {
        let result = PathEvaluator::new(DecisionConfig {
            recency_decay: 0.0,
            ..Default::default()
        });
        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let evaluator = evaluator(AggregationMode::Weighted);
        let path = three_steps();
        assert_eq!(evaluator.evaluate(&path).unwrap(), evaluator.evaluate(&path).unwrap());
    }
}
