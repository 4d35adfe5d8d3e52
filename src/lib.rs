//! Dayloop - daily habit progress and streak engine
//!
//! Tracks four daily tasks per user (gratitude, journal, pomodoro, todo),
//! derives the day's progress percentage, and keeps a consecutive-day streak
//! that rolls over lazily at calendar-day boundaries.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): progress model, calendar rules, ports
//! - **Service Layer** (`services`): the progress engine and the daily reset daemon
//! - **Adapters** (`adapters`): SQLite and in-memory stores, HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dayloop::adapters::memory::InMemoryProgressRepository;
//! use dayloop::{ProgressService, TaskKind};
//!
//! # async fn example() -> Result<(), dayloop::DomainError> {
//! let engine = ProgressService::new(Arc::new(InMemoryProgressRepository::new()));
//! let progress = engine.set_task_completion("u1", TaskKind::Journal, true).await?;
//! assert_eq!(progress.progress_percent, 25);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CompletedTasks, Config, ProgressRecord, ProgressSnapshot, TaskKind, PERCENT_PER_TASK,
};
pub use domain::ports::{Clock, ProgressRepository};
pub use domain::{Calendar, DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ProgressService, SweepReport};
