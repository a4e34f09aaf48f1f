use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::adapters::sqlite::is_valid_table_name;
use crate::domain::models::config::Config;

/// Prefix for environment overrides, e.g. `DEPLOY_MEMORY_DATABASE__PATH`.
pub const ENV_PREFIX: &str = "DEPLOY_MEMORY_";

/// Project config file, lowest-precedence file source.
pub const PROJECT_CONFIG_PATH: &str = ".deploy-memory/config.yaml";

/// Local overrides, not meant to be committed.
pub const LOCAL_CONFIG_PATH: &str = ".deploy-memory/local.yaml";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
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

    #[error("Invalid table_name: {0:?}. Must be a plain SQL identifier")]
    InvalidTableName(String),

    #[error("Invalid {0}: must be at least 1")]
    ZeroWindow(&'static str),

    #[error("Region cannot be empty")]
    EmptyRegion,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .deploy-memory/config.yaml
    /// 3. .deploy-memory/local.yaml
    /// 4. Environment variables (`DEPLOY_MEMORY_*`, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The merged provider chain used by [`load`](Self::load).
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(PROJECT_CONFIG_PATH))
            .merge(Yaml::file(LOCAL_CONFIG_PATH))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        if !is_valid_table_name(&config.database.table_name) {
            return Err(ConfigError::InvalidTableName(config.database.table_name.clone()));
        }

        if config.memory.retention_days == 0 {
            return Err(ConfigError::ZeroWindow("memory.retention_days"));
        }
        if config.memory.stats_window == 0 {
            return Err(ConfigError::ZeroWindow("memory.stats_window"));
        }
        if config.memory.default_query_limit == 0 {
            return Err(ConfigError::ZeroWindow("memory.default_query_limit"));
        }
        if config.collector.event_window == 0 {
            return Err(ConfigError::ZeroWindow("collector.event_window"));
        }

        if config.collector.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if config.collector.aws_cli_path.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "collector.aws_cli_path cannot be empty".to_string(),
            ));
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
