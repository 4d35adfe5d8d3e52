//! Layered configuration loading and validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::calendar::MAX_OFFSET_MINUTES;
use crate::domain::models::config::Config;

/// Directory holding project configuration and the default database.
pub const CONFIG_DIR: &str = ".dayloop";

/// Prefix for environment overrides, e.g. `DAYLOOP_SERVER__PORT`.
pub const ENV_PREFIX: &str = "DAYLOOP_";

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown `logging.level`.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown `logging.format`.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// Unknown `logging.rotation`.
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    /// Blank `database.path`.
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    /// `database.max_connections` of zero.
    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    /// `server.port` of zero.
    #[error("Invalid server port: 0")]
    InvalidPort,

    /// `server.request_timeout_secs` of zero.
    #[error("Invalid request_timeout_secs: {0}. Must be at least 1")]
    InvalidRequestTimeout(u64),

    /// `engine.utc_offset_minutes` outside ±840.
    #[error("Invalid utc_offset_minutes: {0}. Must be within ±{MAX_OFFSET_MINUTES}")]
    InvalidUtcOffset(i32),

    /// `engine.store_timeout_ms` of zero.
    #[error("Invalid store_timeout_ms: {0}. Must be at least 1")]
    InvalidStoreTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .dayloop/config.yaml
    /// 3. .dayloop/local.yaml (optional local overrides)
    /// 4. Environment variables (DAYLOOP_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_from_project_dir(".")
    }

    /// Same as [`Self::load`] with the project files read from `root`.
    pub fn load_from_project_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        Self::extract(&[dir.join("config.yaml"), dir.join("local.yaml")])
            .context("Failed to extract configuration from figment")
    }

    /// Load configuration from a specific file in place of the project files.
    ///
    /// Environment overrides still apply.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Self::extract(&[path.to_path_buf()])
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn extract(files: &[PathBuf]) -> Result<Config> {
        let figment = files
            .iter()
            .fold(Figment::new().merge(Serialized::defaults(Config::default())), |fig, file| {
                fig.merge(Yaml::file(file))
            })
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
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

        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if config.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidRequestTimeout(config.server.request_timeout_secs));
        }

        if config.engine.calendar().is_none() {
            return Err(ConfigError::InvalidUtcOffset(config.engine.utc_offset_minutes));
        }
        if config.engine.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidStoreTimeout(config.engine.store_timeout_ms));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".dayloop/dayloop.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.engine.utc_offset_minutes, 0);
        assert_eq!(config.engine.read_retries, 1);
        assert!(!config.scheduler.enabled);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/path.db
  max_connections: 5
logging:
  level: debug
  format: pretty
server:
  port: 8080
engine:
  utc_offset_minutes: -300
scheduler:
  enabled: true
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.rotation, "daily");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.engine.utc_offset_minutes, -300);
        assert_eq!(config.engine.store_timeout_ms, 5_000);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.max_consecutive_failures, 5);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel("invalid".to_string()))
        );
    }

    #[test]
    fn test_validate_invalid_log_format_and_rotation() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));

        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }

    #[test]
    fn test_validate_database_section() {
        let mut config = Config::default();
        config.database.path = "  ".to_string();
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabasePath));

        let mut config = Config::default();
        config.database.max_connections = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        );
    }

    #[test]
    fn test_validate_server_section() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::InvalidPort));

        let mut config = Config::default();
        config.server.request_timeout_secs = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRequestTimeout(0))
        );
    }

    #[test]
    fn test_validate_engine_section() {
        let mut config = Config::default();
        config.engine.utc_offset_minutes = 900;
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::InvalidUtcOffset(900)));

        config.engine.utc_offset_minutes = -840;
        assert!(ConfigLoader::validate(&config).is_ok());

        config.engine.store_timeout_ms = 0;
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::InvalidStoreTimeout(0)));
    }

    #[test]
    fn test_hierarchical_merging() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.yaml"),
            "server:\n  port: 6000\nlogging:\n  level: info\n  format: pretty\n",
        )
        .unwrap();
        fs::write(dir.join("local.yaml"), "server:\n  port: 7000\nlogging:\n  level: debug\n")
            .unwrap();

        let config = temp_env::with_vars_unset(
            ["DAYLOOP_SERVER__PORT", "DAYLOOP_LOGGING__LEVEL"],
            || ConfigLoader::load_from_project_dir(root.path()),
        )
        .unwrap();

        assert_eq!(config.server.port, 7000, "local.yaml should win");
        assert_eq!(config.logging.level, "debug", "local.yaml should win for nested fields");
        assert_eq!(config.logging.format, "pretty", "config.yaml value should persist");
    }

    #[test]
    fn test_env_overrides_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yaml"), "server:\n  port: 6000\n").unwrap();

        let config = temp_env::with_vars(
            [
                ("DAYLOOP_SERVER__PORT", Some("9090")),
                ("DAYLOOP_ENGINE__UTC_OFFSET_MINUTES", Some("60")),
            ],
            || ConfigLoader::load_from_project_dir(root.path()),
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.engine.utc_offset_minutes, 60);
    }

    #[test]
    fn test_missing_project_files_fall_back_to_defaults() {
        let root = tempfile::tempdir().unwrap();
        let config = temp_env::with_vars_unset(["DAYLOOP_SERVER__PORT"], || {
            ConfigLoader::load_from_project_dir(root.path())
        })
        .unwrap();
        assert_eq!(config.server.port, 5050);
    }

    #[test]
    fn test_load_from_file_validates() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("custom.yaml");
        fs::write(&path, "engine:\n  utc_offset_minutes: 2000\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("utc_offset_minutes"));

        assert!(ConfigLoader::load_from_file(root.path().join("absent.yaml")).is_err());
    }
}
