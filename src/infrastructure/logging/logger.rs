use super::config::{LogConfig, LogFormat, RotationPolicy};
use anyhow::{Context, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "helmsman.log";

/// Logger implementation using tracing
pub struct LoggerImpl {
    guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Install the global subscriber.
    ///
    /// `RUST_LOG` directives take precedence over `config.level`. File output
    /// is always JSON; stdout follows `config.format`. Keep the returned
    /// value alive for the life of the process so buffered file lines get
    /// flushed.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let (file_layer, guard) = match &config.log_dir {
            Some(log_dir) => {
                let file_appender = match config.rotation {
                    RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
                    RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
                    RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_NAME),
                };
                let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking_file)
                    .with_ansi(false)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        let json_stdout = (config.enable_stdout && config.format == LogFormat::Json).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stdout)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
        });

        let pretty_stdout = (config.enable_stdout && config.format == LogFormat::Pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stdout)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
        });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(json_stdout)
            .with(pretty_stdout)
            .try_init()
            .context("a global tracing subscriber is already installed")?;

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { guard })
    }

    /// Whether file output is active.
    pub const fn writes_to_file(&self) -> bool {
        self.guard.is_some()
    }
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
