//! Progress record domain model.
//!
//! A [`ProgressRecord`] holds one user's task checklist for the current day
//! together with their streak. All day-rollover and streak decisions are
//! made here as pure in-memory transitions; the engine wraps them in a
//! single load/save per operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::calendar::Calendar;
use crate::domain::errors::{DomainError, DomainResult};

/// Progress contributed by each completed task.
pub const PERCENT_PER_TASK: u8 = 25;

/// One of the four fixed daily activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Gratitude entry written today.
    Gratitude,
    /// Journal entry written today.
    Journal,
    /// Pomodoro preset finished today.
    Pomodoro,
    /// Every item on today's todo list done.
    Todo,
}

impl TaskKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 4] = [Self::Gratitude, Self::Journal, Self::Pomodoro, Self::Todo];

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gratitude => "gratitude",
            Self::Journal => "journal",
            Self::Pomodoro => "pomodoro",
            Self::Todo => "todo",
        }
    }

    /// Case-insensitive lookup by wire name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gratitude" => Some(Self::Gratitude),
            "journal" => Some(Self::Journal),
            "pomodoro" => Some(Self::Pomodoro),
            "todo" => Some(Self::Todo),
            _ => None,
        }
    }

    /// Parse a task kind, failing with [`DomainError::InvalidTaskKind`].
    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::from_str(s).ok_or_else(|| DomainError::InvalidTaskKind(s.to_string()))
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind completion flags for the current day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTasks {
    /// Gratitude entry written.
    pub gratitude: bool,
    /// Journal entry written.
    pub journal: bool,
    /// Pomodoro preset finished.
    pub pomodoro: bool,
    /// Todo list finished.
    pub todo: bool,
}

impl CompletedTasks {
    /// Flag for `kind`.
    pub fn get(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::Gratitude => self.gratitude,
            TaskKind::Journal => self.journal,
            TaskKind::Pomodoro => self.pomodoro,
            TaskKind::Todo => self.todo,
        }
    }

    /// Set the flag for `kind`.
    pub fn set(&mut self, kind: TaskKind, completed: bool) {
        let flag = match kind {
            TaskKind::Gratitude => &mut self.gratitude,
            TaskKind::Journal => &mut self.journal,
            TaskKind::Pomodoro => &mut self.pomodoro,
            TaskKind::Todo => &mut self.todo,
        };
        *flag = completed;
    }

    /// Number of completed kinds.
    pub fn count(&self) -> usize {
        TaskKind::ALL.iter().filter(|kind| self.get(**kind)).count()
    }

    /// Whether all four kinds are complete.
    pub fn all(&self) -> bool {
        TaskKind::ALL.iter().all(|kind| self.get(*kind))
    }

    /// Reset every flag to false.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `25 × completed`; exactly 100 iff all four are complete.
    pub fn progress_percent(&self) -> u8 {
        if self.all() {
            return 100;
        }
        // count() < 4 here
        PERCENT_PER_TASK * self.count() as u8
    }
}

/// What reconciliation decided for an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    /// Access on the same calendar day as the last one.
    SameDay,
    /// First access on a later calendar day; the checklist was cleared.
    NewDay {
        /// Calendar days between the last access and now.
        days_elapsed: i64,
        /// Streak before the rollover.
        previous_streak: u32,
        /// False when the streak was reset to zero.
        streak_kept: bool,
    },
    /// The clock reads an earlier day than the last recorded access.
    ClockBehind,
}

/// A user's daily checklist and streak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    /// Opaque id owned by the auth layer.
    pub user_id: String,
    /// Today's flags.
    pub completed_tasks: CompletedTasks,
    /// Consecutive qualifying days.
    pub streak: u32,
    /// Most recent read or write.
    pub last_active_at: DateTime<Utc>,
    /// Last time the streak was incremented.
    pub last_streak_update_at: Option<DateTime<Utc>>,
    /// When the record was first stored.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Zero-valued record for a newly registered user.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            completed_tasks: CompletedTasks::default(),
            streak: 0,
            last_active_at: now,
            last_streak_update_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Percentage derived from today's flags.
    pub fn progress_percent(&self) -> u8 {
        self.completed_tasks.progress_percent()
    }

    /// Whether every task is done today.
    pub fn all_tasks_completed(&self) -> bool {
        self.completed_tasks.all()
    }

    /// Apply the day-rollover rules for an access at `now`.
    ///
    /// On the first access of a later day the checklist is cleared, and the
    /// streak survives only when the previous access was yesterday and
    /// yesterday earned a streak increment.
    pub fn reconcile(&mut self, now: DateTime<Utc>, calendar: &Calendar) -> Rollover {
        if calendar.is_earlier_day(now, self.last_active_at) {
            return Rollover::ClockBehind;
        }

        if !calendar.is_earlier_day(self.last_active_at, now) {
            self.touch(now);
            return Rollover::SameDay;
        }

        let days_elapsed = calendar.days_between(self.last_active_at, now);
        let qualified_yesterday = self
            .last_streak_update_at
            .is_some_and(|updated| calendar.is_day_before(updated, now));
        let previous_streak = self.streak;
        let streak_kept = days_elapsed <= 1 && qualified_yesterday;

        if !streak_kept {
            self.streak = 0;
            self.last_streak_update_at = None;
        }
        self.completed_tasks.clear();
        self.last_active_at = now;
        self.updated_at = now;

        Rollover::NewDay {
            days_elapsed,
            previous_streak,
            streak_kept,
        }
    }

    /// Set one task's flag. Returns `true` when this call awarded today's streak increment.
    ///
    /// Clearing a flag never takes back an increment already awarded today.
    pub fn set_task(
        &mut self,
        kind: TaskKind,
        completed: bool,
        now: DateTime<Utc>,
        calendar: &Calendar,
    ) -> bool {
        self.completed_tasks.set(kind, completed);
        self.touch(now);

        let not_awarded_today = self
            .last_streak_update_at
            .map_or(true, |updated| calendar.is_earlier_day(updated, now));

        if self.completed_tasks.all() && not_awarded_today {
            self.streak = self.streak.saturating_add(1);
            self.last_streak_update_at = Some(now);
            return true;
        }
        false
    }

    /// Clear today's checklist, leaving the streak alone.
    pub fn reset_tasks(&mut self, now: DateTime<Utc>) {
        self.completed_tasks.clear();
        self.touch(now);
    }

    /// The caller-facing view of this record.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed_tasks: self.completed_tasks,
            progress_percent: self.progress_percent(),
            streak: self.streak,
            all_tasks_completed: self.all_tasks_completed(),
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_active_at {
            self.last_active_at = now;
        }
        self.updated_at = now;
    }
}

/// Caller-facing view of a progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Today's flags.
    pub completed_tasks: CompletedTasks,
    /// `25 × completed`, 100 iff all complete.
    pub progress_percent: u8,
    /// Consecutive qualifying days.
    pub streak: u32,
    /// True once all four kinds are complete.
    pub all_tasks_completed: bool,
}
