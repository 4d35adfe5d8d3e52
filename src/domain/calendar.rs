//! Calendar day-boundary rules.
//!
//! Every day-boundary decision in the engine goes through [`Calendar`], which
//! maps instants onto calendar days in one fixed reference offset. Nothing
//! here reads the clock or touches storage.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc};

/// Largest supported distance from UTC, in minutes (UTC-14:00 .. UTC+14:00).
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Day-boundary calculator for a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// Calendar whose days start at midnight UTC.
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Calendar whose days start at midnight in `UTC+offset_minutes`.
    ///
    /// Returns `None` when the offset is outside ±14 hours.
    pub fn from_offset_minutes(offset_minutes: i32) -> Option<Self> {
        if offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return None;
        }
        FixedOffset::east_opt(offset_minutes * 60).map(|offset| Self { offset })
    }

    /// Offset whose midnight starts a day.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar day an instant falls on.
    pub fn day_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Whether both instants fall on the same calendar day.
    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.day_of(a) == self.day_of(b)
    }

    /// Whether `earlier` falls on the calendar day immediately before `later`'s day.
    pub fn is_day_before(&self, earlier: DateTime<Utc>, later: DateTime<Utc>) -> bool {
        self.days_between(earlier, later) == 1
    }

    /// Whether `a` falls on a calendar day strictly before `b`'s day.
    pub fn is_earlier_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.day_of(a) < self.day_of(b)
    }

    /// Whole calendar days from `from`'s day to `to`'s day.
    ///
    /// Negative when `to` falls on an earlier day than `from`.
    pub fn days_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        (self.day_of(to) - self.day_of(from)).num_days()
    }

    /// The first instant of the calendar day following `ts`'s day.
    pub fn next_day_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let next = self.day_of(ts).succ_opt().unwrap_or(NaiveDate::MAX);
        let local_midnight = next.and_time(NaiveTime::MIN);
        let offset = TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
        (local_midnight - offset).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_same_day_utc() {
        let cal = Calendar::utc();
        assert!(cal.same_day(at(2024, 3, 10, 0, 0), at(2024, 3, 10, 23, 59)));
        assert!(!cal.same_day(at(2024, 3, 10, 23, 59), at(2024, 3, 11, 0, 0)));
    }

    #[test]
    fn test_day_before_crosses_month_and_year() {
        let cal = Calendar::utc();
        assert!(cal.is_day_before(at(2024, 2, 29, 12, 0), at(2024, 3, 1, 1, 0)));
        assert!(cal.is_day_before(at(2023, 12, 31, 23, 0), at(2024, 1, 1, 0, 30)));
        assert!(!cal.is_day_before(at(2024, 3, 1, 1, 0), at(2024, 3, 1, 2, 0)));
        assert!(!cal.is_day_before(at(2024, 3, 1, 1, 0), at(2024, 3, 3, 2, 0)));
    }

    #[test]
    fn test_days_between_counts_calendar_days_not_hours() {
        let cal = Calendar::utc();
        // Two minutes apart but on different days.
        assert_eq!(cal.days_between(at(2024, 3, 10, 23, 59), at(2024, 3, 11, 0, 1)), 1);
        // 47 hours apart, two boundaries crossed.
        assert_eq!(cal.days_between(at(2024, 3, 10, 0, 30), at(2024, 3, 11, 23, 30)), 1);
        assert_eq!(cal.days_between(at(2024, 3, 10, 0, 30), at(2024, 3, 12, 0, 0)), 2);
        assert_eq!(cal.days_between(at(2024, 3, 12, 0, 0), at(2024, 3, 10, 0, 30)), -2);
    }

    #[test]
    fn test_fixed_offset_shifts_boundary() {
        // UTC+02:00: 22:30 UTC is already the next local day.
        let cal = Calendar::from_offset_minutes(120).unwrap();
        assert!(!cal.same_day(at(2024, 3, 10, 21, 0), at(2024, 3, 10, 22, 30)));
        assert!(cal.is_day_before(at(2024, 3, 10, 21, 0), at(2024, 3, 10, 22, 30)));

        // UTC-05:00: 03:00 UTC still belongs to the previous local day.
        let cal = Calendar::from_offset_minutes(-300).unwrap();
        assert!(cal.same_day(at(2024, 3, 10, 12, 0), at(2024, 3, 11, 3, 0)));
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        assert!(Calendar::from_offset_minutes(MAX_OFFSET_MINUTES).is_some());
        assert!(Calendar::from_offset_minutes(-MAX_OFFSET_MINUTES).is_some());
        assert!(Calendar::from_offset_minutes(MAX_OFFSET_MINUTES + 1).is_none());
    }

    #[test]
    fn test_next_day_start() {
        let cal = Calendar::utc();
        assert_eq!(cal.next_day_start(at(2024, 3, 10, 15, 45)), at(2024, 3, 11, 0, 0));
        assert_eq!(cal.next_day_start(at(2024, 3, 10, 0, 0)), at(2024, 3, 11, 0, 0));

        // Local midnight in UTC+02:00 is 22:00 UTC the previous day.
        let cal = Calendar::from_offset_minutes(120).unwrap();
        assert_eq!(cal.next_day_start(at(2024, 3, 10, 15, 0)), at(2024, 3, 10, 22, 0));
    }
}
