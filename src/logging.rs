use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{DocError, Result};

/// Initializes the application's logging system with the specified log level
///
/// `RUST_LOG` takes precedence over `log_level` when set. Valid log levels
/// are: error, warn, info, debug, trace.
pub fn init(log_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| DocError::Config(format!("Failed to initialize logging: {}", e)))
}

/// Like [`init`], but writes to stderr so stdout stays free for output
pub fn init_stderr(log_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| DocError::Config(format!("Failed to initialize logging: {}", e)))
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(parse_log_level(log_level).into())
        .from_env_lossy()
}

/// Parses a log level string into a LevelFilter
///
/// Returns the corresponding LevelFilter, defaulting to Info for invalid strings
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}
