//! Configuration handling for RefSync

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete RefSync configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub migrations: MigrationsConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    pub logging: Option<LoggingConfig>,
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub schema: Option<String>,
}

/// Migration execution settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MigrationsConfig {
    /// Render and log the DDL without executing it
    #[serde(default)]
    pub dry_run: bool,
}

/// Naming conventions configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NamingConfig {
    #[serde(default = "default_column_style")]
    pub column_style: String,
    /// Pattern for generated index names; `{table}` and `{columns}` are substituted
    #[serde(default = "default_index_pattern")]
    pub index_pattern: String,
    /// Overrides the driver's identifier length limit
    pub max_identifier_length: Option<usize>,
}

fn default_column_style() -> String {
    "snake_case".to_string()
}

fn default_index_pattern() -> String {
    "index_{table}_on_{columns}".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            column_style: default_column_style(),
            index_pattern: default_index_pattern(),
            max_identifier_length: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}
