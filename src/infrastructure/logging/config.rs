use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::models::LoggingConfig;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for log files (optional, if None logs only to stdout)
    pub log_dir: Option<PathBuf>,

    /// Enable stdout logging
    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// Log rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_stdout: true,
            rotation: RotationPolicy::default(),
        }
    }
}

/// Map the validated `logging` section of the main configuration.
///
/// Unknown format or rotation strings fall back to the defaults; the config
/// loader has already rejected them.
impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        let format = match config.format.as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        };
        let rotation = match config.rotation.as_str() {
            "hourly" => RotationPolicy::Hourly,
            "never" => RotationPolicy::Never,
            _ => RotationPolicy::Daily,
        };
        Self {
            level: config.level.clone(),
            format,
            log_dir: config.log_dir.as_ref().map(PathBuf::from),
            enable_stdout: true,
            rotation,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Json
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_logging_section() {
        let section = LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
            log_dir: Some("/tmp/helmsman-logs".to_string()),
            rotation: "hourly".to_string(),
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.rotation, RotationPolicy::Hourly);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/helmsman-logs")));
        assert!(config.enable_stdout);
    }

    #[test]
    fn test_defaults() {
        let config = LogConfig::from(&LoggingConfig::default());
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.rotation, RotationPolicy::Daily);
        assert!(config.log_dir.is_none());
    }
}
