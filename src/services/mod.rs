//! Application services.

pub mod completion_policy;
pub mod daily_reset_daemon;
pub mod progress_service;
pub mod user_locks;

pub use completion_policy::{has_entry_today, pomodoro_completed, todo_list_completed, PomodoroPreset};
pub use daily_reset_daemon::{
    DaemonHandle, DaemonStatus, DailyResetConfig, DailyResetDaemon, DailyResetEvent, StopReason,
};
pub use progress_service::{EngineSettings, ProgressService, SweepFailure, SweepReport};
pub use user_locks::UserLocks;
