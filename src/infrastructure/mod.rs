//! Infrastructure layer module
//!
//! Process-level concerns shared by every adapter:
//! - Configuration management (figment: defaults, YAML files, environment)
//! - Logging infrastructure (tracing-subscriber with optional rolling files)

pub mod config;
pub mod logging;
