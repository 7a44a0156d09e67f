//! Weight learning from the outcome ledger.
//!
//! For a task category the learner:
//! 1. Reads the effective outcome records of that category
//! 2. Returns the default weights unchanged while fewer than `min_outcomes` exist
//! 3. Averages the weights used by successes and by failures
//! 4. Steps from the success mean away from the failure mean by `learning_rate`
//! 5. Floors and renormalizes the result
//! 6. Blends it with the defaults by `min(count / blend_threshold, 1)`
//!
//! The blend ratio rises monotonically with the record count, so there is no
//! jump in behaviour at any particular count.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::models::{
    effective_records, LearningConfig, Outcome, OutcomeFilter, OutcomeRecord, WeightVector,
    WEIGHT_FLOOR,
};
use crate::domain::ports::OutcomeRepository;

/// Learned weights plus the evidence behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedWeights {
    pub task_category: String,
    pub weights: WeightVector,
    /// Share of the learned vector in the final blend (0-1).
    pub blend_ratio: f64,
    pub sample_count: usize,
    pub successes: usize,
    pub failures: usize,
    /// True when the defaults were returned unchanged.
    pub from_defaults: bool,
}

/// `min(count / blend_threshold, 1)`, always in `[0, 1]`.
pub fn blend_ratio(count: usize, blend_threshold: usize) -> f64 {
    if blend_threshold == 0 {
        return 1.0;
    }
    (count as f64 / blend_threshold as f64).min(1.0)
}

/// Derive weights for `task_category` from raw ledger records.
pub fn derive_weights(
    task_category: &str,
    records: &[OutcomeRecord],
    config: &LearningConfig,
) -> LearnedWeights {
    let relevant: Vec<&OutcomeRecord> = effective_records(records)
        .into_iter()
        .filter(|r| r.task_category == task_category)
        .collect();
    let count = relevant.len();

    let successes: Vec<&WeightVector> = relevant
        .iter()
        .filter(|r| r.outcome == Outcome::Success)
        .map(|r| &r.weights_used)
        .collect();
    let failures: Vec<&WeightVector> = relevant
        .iter()
        .filter(|r| r.outcome == Outcome::Failure)
        .map(|r| &r.weights_used)
        .collect();

    if count < config.min_outcomes {
        return LearnedWeights {
            task_category: task_category.to_string(),
            weights: config.default_weights,
            blend_ratio: 0.0,
            sample_count: count,
            successes: successes.len(),
            failures: failures.len(),
            from_defaults: true,
        };
    }

    // With no successes the defaults anchor the step; with no failures there is nothing to move away from.
    let success_mean =
        WeightVector::mean(successes.iter().copied()).unwrap_or(config.default_weights);
    let failure_mean = WeightVector::mean(failures.iter().copied()).unwrap_or(success_mean);

    let learning_rate = config.learning_rate;
    let learned = success_mean
        .zip_with(failure_mean, |s, f| (s - f).mul_add(learning_rate, s))
        .normalized_with_floor(WEIGHT_FLOOR);

    let ratio = blend_ratio(count, config.blend_threshold);
    let weights = learned.blend(config.default_weights, ratio);

    LearnedWeights {
        task_category: task_category.to_string(),
        weights,
        blend_ratio: ratio,
        sample_count: count,
        successes: successes.len(),
        failures: failures.len(),
        from_defaults: false,
    }
}

/// Per-category weight learner with an in-memory cache.
///
/// A cache entry lives until [`WeightLearner::invalidate`] is called for its
/// category, which the orchestrator does after every recorded outcome.
pub struct WeightLearner {
    store: Arc<dyn OutcomeRepository>,
    config: LearningConfig,
    cache: Arc<RwLock<HashMap<String, LearnedWeights>>>,
}

impl WeightLearner {
    pub fn new(store: Arc<dyn OutcomeRepository>, config: LearningConfig) -> Self {
        Self {
            store,
            config,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub const fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Weights to use for the next decision in `task_category`.
    ///
    /// Never fails: when the ledger cannot be read the defaults are returned
    /// and the degradation is logged.
    pub async fn learn(&self, task_category: &str) -> WeightVector {
        self.learn_with_report(task_category).await.weights
    }

    /// Like [`WeightLearner::learn`] but also returns the evidence.
    pub async fn learn_with_report(&self, task_category: &str) -> LearnedWeights {
        if let Some(cached) = self.cache.read().await.get(task_category) {
            return cached.clone();
        }

        let records = match self.store.query(&OutcomeFilter::category(task_category)).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    task_category = %task_category,
                    error = %e,
                    "outcome store unavailable, using default weights"
                );
                return LearnedWeights {
                    task_category: task_category.to_string(),
                    weights: self.config.default_weights,
                    blend_ratio: 0.0,
                    sample_count: 0,
                    successes: 0,
                    failures: 0,
                    from_defaults: true,
                };
            }
        };

        let learned = derive_weights(task_category, &records, &self.config);
        debug!(
            task_category = %task_category,
            samples = learned.sample_count,
            blend_ratio = learned.blend_ratio,
            from_defaults = learned.from_defaults,
            weights = ?learned.weights,
            "weights learned"
        );

        self.cache
            .write()
            .await
            .insert(task_category.to_string(), learned.clone());
        learned
    }

    /// Drop the cached weights of a category.
    pub async fn invalidate(&self, task_category: &str) {
        self.cache.write().await.remove(task_category);
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
    }
}
