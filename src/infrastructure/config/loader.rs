use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::models::config::Config;
use crate::domain::models::WEIGHT_SUM_EPSILON;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid default weights: components must be non-negative and sum to 1.0, got sum {0}")]
    InvalidDefaultWeights(f64),

    #[error("Invalid {name}: {value}. {expected}")]
    InvalidKnob {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("Invalid stuck_threshold: must be at least 1")]
    ZeroStuckThreshold,

    #[error("Invalid max_concurrent_checks: must be at least 1")]
    ZeroConcurrentChecks,

    #[error("Invalid blend_threshold: must be at least 1")]
    ZeroBlendThreshold,

    #[error("Invalid {name}: {value}. Must be at least stuck_threshold ({stuck_threshold})")]
    RingBufferTooSmall {
        name: &'static str,
        value: usize,
        stuck_threshold: usize,
    },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .helmsman/config.yaml
    /// 3. .helmsman/local.yaml (optional local overrides)
    /// 4. Environment variables (HELMSMAN_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`ConfigLoader::load`] with the `.helmsman/` directory under `root`.
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let base = root.as_ref().join(".helmsman");
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base.join("config.yaml")))
            .merge(Yaml::file(base.join("local.yaml")))
            .merge(Env::prefixed("HELMSMAN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let weights = config.learning.default_weights;
        let components_ok = weights
            .to_array()
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        if !components_ok || (weights.sum() - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::InvalidDefaultWeights(weights.sum()));
        }

        let non_negative = [
            ("compound_factor", config.decision.compound_factor),
            ("learning_rate", config.learning.learning_rate),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidKnob {
                    name,
                    value,
                    expected: "Must be a non-negative number",
                });
            }
        }

        let decay = config.decision.recency_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(ConfigError::InvalidKnob {
                name: "recency_decay",
                value: decay,
                expected: "Must be in (0, 1]",
            });
        }

        let epsilon = config.decision.weight_epsilon;
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ConfigError::InvalidKnob {
                name: "weight_epsilon",
                value: epsilon,
                expected: "Must be positive",
            });
        }

        if config.learning.blend_threshold == 0 {
            return Err(ConfigError::ZeroBlendThreshold);
        }

        let progress = &config.progress;
        if progress.stuck_threshold == 0 {
            return Err(ConfigError::ZeroStuckThreshold);
        }
        for (name, value) in [
            ("max_heartbeats", progress.max_heartbeats),
            ("max_state_changes", progress.max_state_changes),
        ] {
            if value < progress.stuck_threshold {
                return Err(ConfigError::RingBufferTooSmall {
                    name,
                    value,
                    stuck_threshold: progress.stuck_threshold,
                });
            }
        }

        if config.diagnostics.max_concurrent_checks == 0 {
            return Err(ConfigError::ZeroConcurrentChecks);
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AggregationMode, WeightVector};

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.decision.aggregation, AggregationMode::Max);
        assert_eq!(config.learning.min_outcomes, 10);
        assert_eq!(config.progress.stuck_threshold, 5);
        assert_eq!(config.diagnostics.max_concurrent_checks, 3);
        assert_eq!(config.database.path, ".helmsman/helmsman.db");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
decision:
  aggregation: weighted
  compound_factor: 0.3
learning:
  min_outcomes: 4
  default_weights:
    effort: 0.4
    risk: 0.3
    alignment: 0.3
    confidence: 0.0
progress:
  stuck_threshold: 3
logging:
  level: debug
  format: pretty
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.decision.aggregation, AggregationMode::Weighted);
        assert!((config.decision.compound_factor - 0.3).abs() < f64::EPSILON);
        assert!((config.decision.recency_decay - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.learning.min_outcomes, 4);
        assert_eq!(config.learning.default_weights, WeightVector::new(0.4, 0.3, 0.3, 0.0));
        assert_eq!(config.progress.stuck_threshold, 3);
        assert_eq!(config.progress.max_heartbeats, 100);
        assert_eq!(config.logging.format, "pretty");
        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_unknown_aggregation_mode_fails_to_parse() {
        let result: Result<Config, _> = serde_yaml::from_str("decision:\n  aggregation: median\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_default_weights_must_sum_to_one() {
        let mut config = Config::default();
        config.learning.default_weights = WeightVector::new(0.5, 0.5, 0.5, 0.0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidDefaultWeights(_))
        ));
    }

    #[test]
    fn test_validate_negative_weight_component() {
        let mut config = Config::default();
        config.learning.default_weights = WeightVector::new(1.2, -0.2, 0.0, 0.0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidDefaultWeights(_))
        ));
    }

    #[test]
    fn test_validate_knobs() {
        let mut config = Config::default();
        config.decision.compound_factor = -0.1;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidKnob { name: "compound_factor", .. })
        ));

        let mut config = Config::default();
        config.learning.learning_rate = f64::NAN;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidKnob { name: "learning_rate", .. })
        ));

        let mut config = Config::default();
        config.decision.recency_decay = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidKnob { name: "recency_decay", .. })
        ));
    }

    #[test]
    fn test_validate_zero_thresholds() {
        let mut config = Config::default();
        config.progress.stuck_threshold = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::ZeroStuckThreshold)));

        let mut config = Config::default();
        config.diagnostics.max_concurrent_checks = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::ZeroConcurrentChecks)));

        let mut config = Config::default();
        config.learning.blend_threshold = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::ZeroBlendThreshold)));
    }

    #[test]
    fn test_validate_ring_buffer_smaller_than_threshold() {
        let mut config = Config::default();
        config.progress.stuck_threshold = 10;
        config.progress.max_state_changes = 5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::RingBufferTooSmall { name: "max_state_changes", value: 5, .. })
        ));
    }

    #[test]
    fn test_validate_logging_and_database() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogFormat(_))));

        let mut config = Config::default();
        config.database.path = String::new();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabasePath)));
    }

    #[test]
    fn test_config_error_is_session_fatal() {
        let err: DomainError = ConfigError::ZeroStuckThreshold.into();
        assert!(err.is_fatal_to_session());
    }
}
