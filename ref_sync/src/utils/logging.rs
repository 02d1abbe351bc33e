//! Logging utilities for RefSync
//!
//! This module provides logging setup and configuration.

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Parse a configured level name, falling back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging based on configuration
pub fn init_logging(config: &Option<LoggingConfig>) -> Result<()> {
    let config = match config {
        Some(cfg) => cfg,
        None => return Ok(()), // No logging configuration, use defaults
    };

    let level = parse_level(&config.level);
    let directive = format!("ref_sync={}", level)
        .parse()
        .map_err(|e| Error::ConfigError(format!("Invalid log directive: {}", e)))?;
    let env_filter = EnvFilter::from_default_env().add_directive(directive);
    let json = config.format.eq_ignore_ascii_case("json");

    if let Some(file_path) = &config.file {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(file_path)?;

        if json {
            let subscriber = fmt::Subscriber::builder()
                .json()
                .with_env_filter(env_filter)
                .with_writer(file)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| Error::Unknown(e.to_string()))?;
        } else {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(file)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| Error::Unknown(e.to_string()))?;
        }
    } else if config.stdout {
        if json {
            let subscriber = fmt::Subscriber::builder()
                .json()
                .with_env_filter(env_filter)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| Error::Unknown(e.to_string()))?;
        } else {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| Error::Unknown(e.to_string()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("chatty"), Level::INFO);
    }

    #[test]
    fn test_no_config_is_noop() {
        assert!(init_logging(&None).is_ok());
    }
}
