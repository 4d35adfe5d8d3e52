//! Wiring shared by every command: configuration, logging, storage, engine.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::sqlite::{initialize_database, PoolConfig, SqliteProgressRepository};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::{EngineSettings, ProgressService};

/// Engine over the SQLite store.
pub type Engine = ProgressService<SqliteProgressRepository>;

/// Everything a command needs, built once per process.
pub struct AppContext {
    /// Validated configuration.
    pub config: Config,
    /// Shared engine.
    pub service: Arc<Engine>,
    _logger: LoggerImpl,
}

impl AppContext {
    /// Load configuration, start logging, open the database.
    pub async fn bootstrap(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        let log_config = LogConfig::try_from(&config.logging)?;
        let logger = LoggerImpl::init(&log_config)?;
        let service = build_service(&config).await?;

        Ok(Self {
            config,
            service: Arc::new(service),
            _logger: logger,
        })
    }
}

/// `--config` file when given, else the project files.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Engine over the configured SQLite database.
pub async fn build_service(config: &Config) -> Result<Engine> {
    let pool = initialize_database(&config.database.url(), Some(PoolConfig::from(&config.database)))
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;

    let calendar = config
        .engine
        .calendar()
        .context("engine.utc_offset_minutes is out of range")?;

    Ok(ProgressService::new(Arc::new(SqliteProgressRepository::new(pool)))
        .with_calendar(calendar)
        .with_settings(EngineSettings::from(&config.engine)))
}
