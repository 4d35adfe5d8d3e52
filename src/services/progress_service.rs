//! Progress & streak engine.
//!
//! [`ProgressService`] is the only writer of progress records. Every public
//! operation runs the same pipeline under the user's lock: load (retried),
//! reconcile the day rollover, apply the operation in memory, save once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::calendar::Calendar;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EngineConfig, ProgressRecord, ProgressSnapshot, Rollover, TaskKind};
use crate::domain::ports::{Clock, ProgressRepository, SystemClock};
use crate::services::user_locks::UserLocks;

/// Longest user id accepted from callers.
pub const MAX_USER_ID_LEN: usize = 256;

/// Store access tuning for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Upper bound on each individual store call.
    pub store_timeout: Duration,
    /// Extra attempts for a failed read.
    pub read_retries: u32,
    /// Pause before each retry.
    pub read_retry_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            read_retries: config.read_retries,
            read_retry_delay: Duration::from_millis(config.read_retry_delay_ms),
        }
    }
}

/// Outcome of resetting every stored user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Users listed by the store.
    pub users_seen: usize,
    /// Users whose checklist was cleared.
    pub users_reset: usize,
    /// Users that could not be reset.
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Whether every listed user was reset.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One user the sweep could not reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    /// Affected user.
    pub user_id: String,
    /// Error text.
    pub error: String,
}

/// Sole writer of progress records.
pub struct ProgressService<R: ProgressRepository> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
    settings: EngineSettings,
    locks: UserLocks,
}

impl<R: ProgressRepository> ProgressService<R> {
    /// Engine on the system clock with UTC day boundaries.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
            calendar: Calendar::utc(),
            settings: EngineSettings::default(),
            locks: UserLocks::new(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the day-boundary calendar.
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Replace store timeouts and retry settings.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Calendar that decides day boundaries.
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Current time on the engine clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Bring a user's record up to date with the current day.
    ///
    /// Creates a zero-valued record on first access.
    #[instrument(skip(self))]
    pub async fn reconcile_on_access(&self, user_id: &str) -> DomainResult<ProgressSnapshot> {
        let (record, ()) = self.mutate(user_id, |_, _, _| ()).await?;
        Ok(record.snapshot())
    }

    /// Current progress for a user, after reconciliation.
    #[instrument(skip(self))]
    pub async fn get_progress(&self, user_id: &str) -> DomainResult<ProgressSnapshot> {
        self.reconcile_on_access(user_id).await
    }

    /// Mark one task kind as done or not done today.
    ///
    /// Awards the day's streak increment the first time all four kinds are
    /// complete. Clearing a flag afterwards keeps the increment.
    #[instrument(skip(self))]
    pub async fn set_task_completion(
        &self,
        user_id: &str,
        kind: TaskKind,
        completed: bool,
    ) -> DomainResult<ProgressSnapshot> {
        let (record, awarded) = self
            .mutate(user_id, |record, now, calendar| {
                record.set_task(kind, completed, now, calendar)
            })
            .await?;

        if awarded {
            info!(user_id = %record.user_id, streak = record.streak, "all tasks completed, streak extended");
        }
        Ok(record.snapshot())
    }

    /// Same as [`Self::set_task_completion`] with the kind given as a string.
    ///
    /// Unknown kinds fail with [`DomainError::InvalidTaskKind`] before any store access.
    pub async fn set_task_completion_str(
        &self,
        user_id: &str,
        kind: &str,
        completed: bool,
    ) -> DomainResult<ProgressSnapshot> {
        let kind = TaskKind::parse(kind)?;
        self.set_task_completion(user_id, kind, completed).await
    }

    /// Clear today's checklist without touching the streak.
    #[instrument(skip(self))]
    pub async fn reset_daily(&self, user_id: &str) -> DomainResult<ProgressSnapshot> {
        let (record, ()) = self
            .mutate(user_id, |record, now, _| record.reset_tasks(now))
            .await?;
        Ok(record.snapshot())
    }

    /// Ensure a record exists for a newly created user.
    pub async fn register_user(&self, user_id: &str) -> DomainResult<ProgressSnapshot> {
        self.reconcile_on_access(user_id).await
    }

    /// Delete a user's record. Returns whether one existed.
    #[instrument(skip(self))]
    pub async fn remove_user(&self, user_id: &str) -> DomainResult<bool> {
        let user_id = normalize_user_id(user_id)?;
        let _guard = self.locks.acquire(user_id).await;
        let removed = self
            .bounded("delete", self.repository.delete(user_id))
            .await?;
        if removed {
            info!(user_id, "progress record removed");
        }
        Ok(removed)
    }

    /// Run [`Self::reset_daily`] for every stored user.
    ///
    /// A failing user is recorded in the report and the sweep moves on.
    #[instrument(skip(self))]
    pub async fn reset_all_daily(&self) -> DomainResult<SweepReport> {
        let user_ids = self
            .read_with_retry("list", || self.repository.list_user_ids())
            .await?;

        let mut report = SweepReport {
            users_seen: user_ids.len(),
            ..SweepReport::default()
        };

        for user_id in user_ids {
            match self.reset_daily(&user_id).await {
                Ok(_) => report.users_reset += 1,
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "daily reset failed for user");
                    report.failures.push(SweepFailure {
                        user_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            users_seen = report.users_seen,
            users_reset = report.users_reset,
            failures = report.failures.len(),
            "daily reset sweep finished"
        );
        Ok(report)
    }

    /// Load, reconcile, apply `op`, save. Serialized per user.
    async fn mutate<T>(
        &self,
        user_id: &str,
        op: impl FnOnce(&mut ProgressRecord, DateTime<Utc>, &Calendar) -> T,
    ) -> DomainResult<(ProgressRecord, T)> {
        let user_id = normalize_user_id(user_id)?;
        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();

        let mut record = match self
            .read_with_retry("load", || self.repository.load(user_id))
            .await?
        {
            Some(mut record) => {
                log_rollover(user_id, record.reconcile(now, &self.calendar));
                record
            }
            None => {
                info!(user_id, "initializing progress record");
                ProgressRecord::new(user_id, now)
            }
        };

        let outcome = op(&mut record, now, &self.calendar);

        self.bounded("save", self.repository.save(&record)).await?;
        Ok((record, outcome))
    }

    async fn read_with_retry<T, F, Fut>(&self, what: &str, mut read: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match self.bounded(what, read()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.settings.read_retries => {
                    attempt += 1;
                    warn!(operation = what, attempt, error = %err, "store read failed, retrying");
                    tokio::time::sleep(self.settings.read_retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn bounded<T>(
        &self,
        what: &str,
        call: impl Future<Output = DomainResult<T>>,
    ) -> DomainResult<T> {
        tokio::time::timeout(self.settings.store_timeout, call)
            .await
            .map_err(|_| {
                DomainError::StorageError(format!(
                    "store {what} timed out after {}ms",
                    self.settings.store_timeout.as_millis()
                ))
            })?
    }
}

/// Trim surrounding whitespace so every entry point keys records the same way.
fn normalize_user_id(user_id: &str) -> DomainResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_USER_ID_LEN {
        return Err(DomainError::InvalidUserId(user_id.to_string()));
    }
    Ok(trimmed)
}

fn log_rollover(user_id: &str, rollover: Rollover) {
    match rollover {
        Rollover::SameDay => {}
        Rollover::NewDay {
            days_elapsed,
            previous_streak,
            streak_kept,
        } => {
            if streak_kept {
                debug!(user_id, days_elapsed, streak = previous_streak, "new day, streak carried");
            } else if previous_streak > 0 {
                info!(user_id, days_elapsed, previous_streak, "new day, streak broken");
            } else {
                debug!(user_id, days_elapsed, "new day");
            }
        }
        Rollover::ClockBehind => {
            warn!(user_id, "clock reads an earlier day than last activity, skipping rollover");
        }
    }
}
