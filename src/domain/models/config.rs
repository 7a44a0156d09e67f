use serde::{Deserialize, Serialize};

use super::weights::WeightVector;

/// Main configuration structure for Helmsman
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Path scoring and ranking
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Weight learning from the outcome ledger
    #[serde(default)]
    pub learning: LearningConfig,

    /// Heartbeat and stuck detection
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Background liveness diagnostics
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Periodic checkpointing
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How per-step risk is folded into a path-level risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Weakest link: the riskiest step defines the path.
    #[default]
    Max,
    Average,
    /// Exponential recency weighting favouring later steps.
    Weighted,
}

impl AggregationMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Average => "average",
            Self::Weighted => "weighted",
        }
    }
}

impl std::str::FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "average" => Ok(Self::Average),
            "weighted" => Ok(Self::Weighted),
            other => Err(format!(
                "unknown aggregation mode '{other}', expected one of: max, average, weighted"
            )),
        }
    }
}

/// Decision engine and path evaluator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DecisionConfig {
    #[serde(default)]
    pub aggregation: AggregationMode,

    /// Coordination overhead added per extra step
    #[serde(default = "default_compound_factor")]
    pub compound_factor: f64,

    /// Decay applied per step of distance from the final step in `weighted` mode
    #[serde(default = "default_recency_decay")]
    pub recency_decay: f64,

    /// Tolerance when checking that weights sum to one
    #[serde(default = "default_weight_epsilon")]
    pub weight_epsilon: f64,
}

const fn default_compound_factor() -> f64 {
    0.2
}

const fn default_recency_decay() -> f64 {
    0.5
}

const fn default_weight_epsilon() -> f64 {
    1e-6
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationMode::default(),
            compound_factor: default_compound_factor(),
            recency_decay: default_recency_decay(),
            weight_epsilon: default_weight_epsilon(),
        }
    }
}

/// Weight learner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LearningConfig {
    /// Records required before learned weights are trusted
    #[serde(default = "default_min_outcomes")]
    pub min_outcomes: usize,

    /// Step size away from the failure pattern
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Record count at which learned weights fully replace the defaults
    #[serde(default = "default_blend_threshold")]
    pub blend_threshold: usize,

    /// Process-wide fallback weights
    #[serde(default)]
    pub default_weights: WeightVector,
}

const fn default_min_outcomes() -> usize {
    10
}

const fn default_learning_rate() -> f64 {
    0.1
}

const fn default_blend_threshold() -> usize {
    50
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_outcomes: default_min_outcomes(),
            learning_rate: default_learning_rate(),
            blend_threshold: default_blend_threshold(),
            default_weights: WeightVector::default(),
        }
    }
}

/// Progress tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProgressConfig {
    /// Expected gap between heartbeats; liveness allows twice this
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Heartbeats without a state change before the loop counts as stuck
    #[serde(default = "default_stuck_threshold")]
    pub stuck_threshold: usize,

    #[serde(default = "default_max_heartbeats")]
    pub max_heartbeats: usize,

    #[serde(default = "default_max_state_changes")]
    pub max_state_changes: usize,
}

const fn default_heartbeat_interval_ms() -> u64 {
    5_000
}

const fn default_stuck_threshold() -> usize {
    5
}

const fn default_max_heartbeats() -> usize {
    100
}

const fn default_max_state_changes() -> usize {
    50
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            stuck_threshold: default_stuck_threshold(),
            max_heartbeats: default_max_heartbeats(),
            max_state_changes: default_max_state_changes(),
        }
    }
}

/// Diagnostic dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiagnosticsConfig {
    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,

    /// How long completed results stay retrievable
    #[serde(default = "default_result_retention_secs")]
    pub result_retention_secs: u64,

    /// How long the loop waits for a fresh result (0 = poll only)
    #[serde(default)]
    pub result_wait_ms: u64,
}

const fn default_max_concurrent_checks() -> usize {
    3
}

const fn default_result_retention_secs() -> u64 {
    60
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: default_max_concurrent_checks(),
            result_retention_secs: default_result_retention_secs(),
            result_wait_ms: 0,
        }
    }
}

/// Checkpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    /// Save every N iterations (0 disables periodic saves)
    #[serde(default = "default_interval_iterations")]
    pub interval_iterations: u64,
}

const fn default_interval_iterations() -> u64 {
    5
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval_iterations: default_interval_iterations(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".helmsman/helmsman.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
