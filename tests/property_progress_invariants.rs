use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use dayloop::domain::models::{ProgressRecord, TaskKind};
use dayloop::domain::Calendar;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn task_kind() -> impl Strategy<Value = TaskKind> {
    prop::sample::select(TaskKind::ALL.to_vec())
}

/// (minutes after the previous step, task kind, completed)
fn steps(max_gap_minutes: i64) -> impl Strategy<Value = Vec<(i64, TaskKind, bool)>> {
    prop::collection::vec((0..=max_gap_minutes, task_kind(), any::<bool>()), 1..60)
}

proptest! {
    /// Property: progress percent is always 25 per completed task, and 100
    /// exactly when every task is complete.
    #[test]
    fn prop_percent_matches_flags(ops in steps(30)) {
        let cal = Calendar::utc();
        let mut now = start();
        let mut record = ProgressRecord::new("p", now);

        for (gap, kind, completed) in ops {
            now += Duration::minutes(gap);
            record.reconcile(now, &cal);
            record.set_task(kind, completed, now, &cal);

            let count = record.completed_tasks.count();
            let percent = usize::from(record.progress_percent());
            prop_assert_eq!(percent, 25 * count);
            prop_assert_eq!(record.progress_percent() == 100, record.all_tasks_completed());
        }
    }

    /// Property: within one calendar day the streak moves by at most one,
    /// and it moves iff the checklist was complete at some point that day.
    #[test]
    fn prop_streak_at_most_once_per_day(
        ops in prop::collection::vec((task_kind(), any::<bool>()), 1..80),
        initial_streak in 0u32..50,
    ) {
        let cal = Calendar::utc();
        let day_start = start() + Duration::hours(1);
        let mut record = ProgressRecord::new("p", day_start);
        record.streak = initial_streak;

        let mut ever_complete = false;
        for (i, (kind, completed)) in ops.into_iter().enumerate() {
            let now = day_start + Duration::minutes(i64::try_from(i).unwrap());
            record.reconcile(now, &cal);
            record.set_task(kind, completed, now, &cal);
            ever_complete |= record.all_tasks_completed();
            prop_assert!(record.streak <= initial_streak + 1);
        }

        let expected = if ever_complete { initial_streak + 1 } else { initial_streak };
        prop_assert_eq!(record.streak, expected);
    }

    /// Property: reconciling twice at the same instant changes nothing the
    /// second time.
    #[test]
    fn prop_reconcile_idempotent(ops in steps(24 * 60), later_gap in 0i64..(4 * 24 * 60)) {
        let cal = Calendar::utc();
        let mut now = start();
        let mut record = ProgressRecord::new("p", now);
        for (gap, kind, completed) in ops {
            now += Duration::minutes(gap);
            record.reconcile(now, &cal);
            record.set_task(kind, completed, now, &cal);
        }

        let later = now + Duration::minutes(later_gap);
        record.reconcile(later, &cal);
        let once = record.clone();
        record.reconcile(later, &cal);
        prop_assert_eq!(record, once);
    }

    /// Property: the streak never exceeds the number of distinct days seen,
    /// and a new day always starts with an empty checklist.
    #[test]
    fn prop_streak_bounded_by_days(ops in steps(36 * 60), offset in -840i32..=840) {
        let cal = Calendar::from_offset_minutes(offset).unwrap();
        let mut now = start();
        let mut record = ProgressRecord::new("p", now);
        let mut days = std::collections::BTreeSet::new();
        days.insert(cal.day_of(now));

        for (gap, kind, completed) in ops {
            now += Duration::minutes(gap);
            let new_day = days.insert(cal.day_of(now));
            record.reconcile(now, &cal);
            if new_day {
                prop_assert_eq!(record.progress_percent(), 0);
            }
            record.set_task(kind, completed, now, &cal);
            prop_assert!(record.streak as usize <= days.len());
        }
    }
}
