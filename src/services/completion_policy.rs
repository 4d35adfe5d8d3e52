//! Completion rules for task producers.
//!
//! Producers own their own state (entries, todo lists, timers) and report to
//! the engine only through `set_task_completion`. These helpers compute the
//! `completed` argument they should pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::calendar::Calendar;

/// Gratitude and journal rule: done once any entry is dated today.
pub fn has_entry_today<I>(entry_times: I, now: DateTime<Utc>, calendar: &Calendar) -> bool
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    entry_times
        .into_iter()
        .any(|created| calendar.same_day(created, now))
}

/// Todo rule: the list must be non-empty and every item done.
pub fn todo_list_completed<I>(done_flags: I) -> bool
where
    I: IntoIterator<Item = bool>,
{
    let mut seen_any = false;
    for done in done_flags {
        if !done {
            return false;
        }
        seen_any = true;
    }
    seen_any
}

/// Timer presets offered to pomodoro users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PomodoroPreset {
    /// 25 min work, 5 min break, 8 cycles.
    Beginner,
    /// 50 min work, 10 min break, 4 cycles.
    Intermediate,
    /// 150 min work, 30 min break, 2 cycles.
    FlowState,
}

impl PomodoroPreset {
    /// Every preset, shortest work block first.
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::FlowState];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::FlowState => "Flow State",
        }
    }

    /// Length of one work block.
    pub fn work_duration(&self) -> Duration {
        Duration::from_secs(match self {
            Self::Beginner => 25 * 60,
            Self::Intermediate => 50 * 60,
            Self::FlowState => 150 * 60,
        })
    }

    /// Length of the break after each work block.
    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(match self {
            Self::Beginner => 5 * 60,
            Self::Intermediate => 10 * 60,
            Self::FlowState => 30 * 60,
        })
    }

    /// Work/break cycles that make up a full session.
    pub fn cycles(&self) -> u32 {
        match self {
            Self::Beginner => 8,
            Self::Intermediate => 4,
            Self::FlowState => 2,
        }
    }

    /// Wall time of a full session, breaks included.
    pub fn session_duration(&self) -> Duration {
        (self.work_duration() + self.break_duration()) * self.cycles()
    }

    /// Lenient lookup: case, spaces and dashes are ignored.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "flow" | "flow_state" => Some(Self::FlowState),
            _ => None,
        }
    }
}

impl fmt::Display for PomodoroPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pomodoro rule: done once the preset's full cycle count has been worked.
pub fn pomodoro_completed(preset: PomodoroPreset, completed_cycles: u32) -> bool {
    completed_cycles >= preset.cycles()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_has_entry_today() {
        let cal = Calendar::utc();
        assert!(!has_entry_today(Vec::new(), at(2, 9), &cal));
        assert!(!has_entry_today(vec![at(1, 23)], at(2, 9), &cal));
        assert!(has_entry_today(vec![at(1, 23), at(2, 0)], at(2, 9), &cal));
    }

    #[test]
    fn test_has_entry_today_respects_offset() {
        // 23:00 UTC on the 1st is already the 2nd in UTC+02:00.
        let cal = Calendar::from_offset_minutes(120).unwrap();
        assert!(has_entry_today(vec![at(1, 23)], at(2, 9), &cal));
    }

    #[test]
    fn test_todo_list_completed() {
        assert!(!todo_list_completed(Vec::new()));
        assert!(!todo_list_completed(vec![true, false, true]));
        assert!(todo_list_completed(vec![true]));
        assert!(todo_list_completed(vec![true, true, true]));
    }

    #[test]
    fn test_pomodoro_presets() {
        assert_eq!(PomodoroPreset::Beginner.work_duration(), Duration::from_secs(25 * 60));
        assert_eq!(PomodoroPreset::Intermediate.break_duration(), Duration::from_secs(10 * 60));
        assert_eq!(PomodoroPreset::FlowState.cycles(), 2);
        assert_eq!(
            PomodoroPreset::FlowState.session_duration(),
            Duration::from_secs(2 * 180 * 60)
        );
    }

    #[test]
    fn test_pomodoro_completed_after_all_cycles() {
        assert!(!pomodoro_completed(PomodoroPreset::Beginner, 7));
        assert!(pomodoro_completed(PomodoroPreset::Beginner, 8));
        assert!(pomodoro_completed(PomodoroPreset::Intermediate, 4));
        assert!(!pomodoro_completed(PomodoroPreset::FlowState, 0));
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(PomodoroPreset::from_str("Flow State"), Some(PomodoroPreset::FlowState));
        assert_eq!(PomodoroPreset::from_str("flow"), Some(PomodoroPreset::FlowState));
        assert_eq!(PomodoroPreset::from_str("BEGINNER"), Some(PomodoroPreset::Beginner));
        assert_eq!(PomodoroPreset::from_str("expert"), None);
        for preset in PomodoroPreset::ALL {
            assert_eq!(PomodoroPreset::from_str(preset.name()), Some(preset));
        }
    }
}
