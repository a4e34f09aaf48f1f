use serde::{Deserialize, Serialize};

/// Main configuration structure for deploy memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Event retention and query configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Stack event collection configuration
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Table holding deploy memory events
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

fn default_database_path() -> String {
    ".deploy-memory/deploy-memory.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

fn default_table_name() -> String {
    "deploy_memory_events".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            table_name: default_table_name(),
        }
    }
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

/// Event retention and query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryConfig {
    /// Days an event is kept before it expires
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Maximum events aggregated by stats queries
    #[serde(default = "default_stats_window")]
    pub stats_window: u32,

    /// Default limit for history queries
    #[serde(default = "default_query_limit")]
    pub default_query_limit: u32,
}

const fn default_retention_days() -> u32 {
    90
}

const fn default_stats_window() -> u32 {
    1000
}

const fn default_query_limit() -> u32 {
    20
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            stats_window: default_stats_window(),
            default_query_limit: default_query_limit(),
        }
    }
}

/// Stack event collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectorConfig {
    /// Number of recent stack events inspected per collection
    #[serde(default = "default_event_window")]
    pub event_window: u32,

    /// Region recorded on events and passed to the engine
    #[serde(default = "default_region")]
    pub region: String,

    /// Optional named credentials profile
    #[serde(default)]
    pub profile: Option<String>,

    /// Path to the AWS CLI binary
    #[serde(default = "default_aws_cli_path")]
    pub aws_cli_path: String,
}

const fn default_event_window() -> u32 {
    50
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_aws_cli_path() -> String {
    "aws".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            event_window: default_event_window(),
            region: default_region(),
            profile: None,
            aws_cli_path: default_aws_cli_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation policy for file logs: daily, hourly, never
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
