//! Domain models.

pub mod config;
pub mod progress;

pub use config::{
    Config, DatabaseConfig, EngineConfig, LoggingConfig, SchedulerConfig, ServerConfig,
};
pub use progress::{
    CompletedTasks, ProgressRecord, ProgressSnapshot, Rollover, TaskKind, PERCENT_PER_TASK,
};
