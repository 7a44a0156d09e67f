//! Weighted-sum multi-criteria ranking of candidate paths.
//!
//! Every criterion is mapped onto a 0-10 scale where higher is better, then
//! combined with a [`WeightVector`]:
//!
//! ```text
//! effort     = 10 - clamp(total_effort, 0, 10)
//! risk       = 10 - clamp(aggregate_risk, 0, 10)
//! alignment  = terminal_alignment * 10
//! confidence = path_confidence * 10
//! overall    = Σ score[k] * weight[k]
//! ```
//!
//! Ties on `overall` are broken by higher path confidence, then lower total
//! effort, then input order, so ranking is fully deterministic.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, DecisionConfig, Path, ScoreComponents, WeightVector};
use crate::services::path_evaluator::{PathEvaluator, PathScoreInputs};

/// One scored path in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position after sorting.
    pub rank: usize,
    /// Position in the caller's input.
    pub input_index: usize,
    pub path: Path,
    pub inputs: PathScoreInputs,
    pub components: ScoreComponents,
    pub overall_score: f64,
    /// Set on the top entry only.
    pub recommended: bool,
    /// Sub-scores rendered as evidence for audit logs.
    pub rationale: String,
}

impl RankedEntry {
    /// The step to execute now: the head of the path.
    pub fn next_step(&self) -> &Candidate {
        &self.path.steps[0]
    }
}

/// Entries sorted best first, together with the weights that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    pub entries: Vec<RankedEntry>,
    pub weights: WeightVector,
}

impl RankedList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }
}

/// Result of [`DecisionEngine::choose`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub chosen: RankedEntry,
    /// Lowest-ranked entry, held in reserve. Same as `chosen` for a single-entry ranking.
    pub fallback: RankedEntry,
}

impl Choice {
    pub fn has_distinct_fallback(&self) -> bool {
        self.chosen.rank != self.fallback.rank
    }
}

/// Ranks paths and picks one.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    evaluator: PathEvaluator,
    weight_epsilon: f64,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> DomainResult<Self> {
        let weight_epsilon = config.weight_epsilon;
        if !(weight_epsilon.is_finite() && weight_epsilon > 0.0) {
            return Err(DomainError::Configuration(format!(
                "weight_epsilon must be positive, got {weight_epsilon}"
            )));
        }
        Ok(Self {
            evaluator: PathEvaluator::new(config)?,
            weight_epsilon,
        })
    }

    pub const fn evaluator(&self) -> &PathEvaluator {
        &self.evaluator
    }

    /// Map evaluator output onto the 0-10 scale and weight it.
    pub fn score(inputs: &PathScoreInputs, weights: &WeightVector) -> (ScoreComponents, f64) {
        let components = ScoreComponents {
            effort: 10.0 - inputs.total_effort.clamp(0.0, 10.0),
            risk: 10.0 - inputs.aggregate_risk.clamp(0.0, 10.0),
            alignment: inputs.terminal_alignment.clamp(0.0, 1.0) * 10.0,
            confidence: inputs.path_confidence.clamp(0.0, 1.0) * 10.0,
        };
        let overall = components.effort * weights.effort
            + components.risk * weights.risk
            + components.alignment * weights.alignment
            + components.confidence * weights.confidence;
        (components, overall)
    }

    /// Score and sort paths, best first.
    pub fn rank(&self, paths: &[Path], weights: &WeightVector) -> DomainResult<RankedList> {
        if paths.is_empty() {
            return Err(DomainError::NoCandidates);
        }
        weights.validate(self.weight_epsilon)?;

        let mut entries = paths
            .iter()
            .enumerate()
            .map(|(input_index, path)| {
                let inputs = self.evaluator.evaluate(path)?;
                let (components, overall_score) = Self::score(&inputs, weights);
                let rationale = rationale(path, &inputs, &components, overall_score);
                Ok(RankedEntry {
                    rank: 0,
                    input_index,
                    path: path.clone(),
                    inputs,
                    components,
                    overall_score,
                    recommended: false,
                    rationale,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        entries.sort_by(compare_entries);
        for (position, entry) in entries.iter_mut().enumerate() {
            entry.rank = position + 1;
            entry.recommended = position == 0;
        }

        debug!(
            paths = entries.len(),
            top = %entries[0].inputs.path_id,
            top_score = entries[0].overall_score,
            "ranked candidate paths"
        );

        Ok(RankedList {
            entries,
            weights: *weights,
        })
    }

    /// Rank bare candidates as one-step paths.
    pub fn rank_candidates(
        &self,
        candidates: &[Candidate],
        weights: &WeightVector,
    ) -> DomainResult<RankedList> {
        let paths: Vec<Path> = candidates.iter().cloned().map(Path::single).collect();
        self.rank(&paths, weights)
    }

    /// Top entry as `chosen`, bottom entry as `fallback`.
    pub fn choose(&self, ranked: &RankedList) -> DomainResult<Choice> {
        let (Some(chosen), Some(fallback)) = (ranked.entries.first(), ranked.entries.last()) else {
            return Err(DomainError::NoCandidates);
        };

        info!(
            chosen = %chosen.inputs.path_id,
            score = chosen.overall_score,
            fallback = %fallback.inputs.path_id,
            rationale = %chosen.rationale,
            "decision made"
        );

        Ok(Choice {
            chosen: chosen.clone(),
            fallback: fallback.clone(),
        })
    }
}

fn compare_entries(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.overall_score
        .total_cmp(&a.overall_score)
        .then_with(|| b.inputs.path_confidence.total_cmp(&a.inputs.path_confidence))
        .then_with(|| a.inputs.total_effort.total_cmp(&b.inputs.total_effort))
        .then_with(|| a.input_index.cmp(&b.input_index))
}

fn rationale(
    path: &Path,
    inputs: &PathScoreInputs,
    components: &ScoreComponents,
    overall: f64,
) -> String {
    let mut text = format!(
        "effort {:.2}/10 (total {:.1}), risk {:.2}/10 (aggregate {:.1}), \
         alignment {:.2}/10, confidence {:.2}/10 (path {:.3}); overall {:.3}; \
         {} step(s), compound complexity {:.2}",
        components.effort,
        inputs.total_effort,
        components.risk,
        inputs.aggregate_risk,
        components.alignment,
        components.confidence,
        inputs.path_confidence,
        overall,
        inputs.step_count,
        inputs.compound_complexity,
    );

    let dominant = path
        .steps
        .iter()
        .filter_map(Candidate::dominant_risk_factor)
        .max_by(|a, b| a.exposure().total_cmp(&b.exposure()));
    if let Some(factor) = dominant {
        text.push_str(&format!(
            "; top risk '{}' (exposure {:.2})",
            factor.name,
            factor.exposure()
        ));
    }
    text
}
