//! Configuration model, one struct per YAML section.

use serde::{Deserialize, Serialize};

use crate::domain::calendar::Calendar;

/// Main configuration structure for dayloop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Progress engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Daily reset scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
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
}

fn default_database_path() -> String {
    ".dayloop/dayloop.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
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

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
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

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to allow cross-origin requests
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    5050
}

const fn default_true() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Progress engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Offset from UTC, in minutes, of the timezone whose midnight starts a day
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Upper bound for a single store load or save
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Extra attempts for a failed load
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,

    /// Pause between load attempts
    #[serde(default = "default_read_retry_delay_ms")]
    pub read_retry_delay_ms: u64,
}

const fn default_store_timeout_ms() -> u64 {
    5_000
}

const fn default_read_retries() -> u32 {
    1
}

const fn default_read_retry_delay_ms() -> u64 {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            store_timeout_ms: default_store_timeout_ms(),
            read_retries: default_read_retries(),
            read_retry_delay_ms: default_read_retry_delay_ms(),
        }
    }
}

impl EngineConfig {
    /// Day-boundary calendar for the configured offset, if it is in range.
    pub fn calendar(&self) -> Option<Calendar> {
        Calendar::from_offset_minutes(self.utc_offset_minutes)
    }
}

/// Daily reset scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Run the midnight sweep alongside the HTTP server
    #[serde(default)]
    pub enabled: bool,

    /// Sweep once immediately when the scheduler starts
    #[serde(default)]
    pub run_on_startup: bool,

    /// Stop after this many failed sweeps in a row
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

const fn default_max_consecutive_failures() -> u32 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            run_on_startup: false,
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}
