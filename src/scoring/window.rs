use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::time::{local_date, local_midnight_utc};

/// Half-open UTC interval `[start, end)`. `end = None` leaves it open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && self.end.map_or(true, |end| instant < end)
    }
}

/// ISO 8601 week, e.g. `2026-W42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl std::fmt::Display for WeekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindows {
    /// From this Monday 00:00 (UTC+8) up to now.
    pub this_week: TimeWindow,
    /// The seven days before `this_week`.
    pub last_week: TimeWindow,
    pub this_week_key: WeekKey,
    pub last_week_key: WeekKey,
}

impl WeekWindows {
    pub fn resolve(now: DateTime<Utc>) -> Self {
        let today = local_date(now);
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let last_monday = monday - Duration::days(7);

        let this_start = local_midnight_utc(monday);
        let last_start = local_midnight_utc(last_monday);

        Self {
            this_week: TimeWindow {
                start: this_start,
                end: Some(now),
            },
            last_week: TimeWindow {
                start: last_start,
                end: Some(this_start),
            },
            this_week_key: WeekKey::of(monday),
            last_week_key: WeekKey::of(last_monday),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn midweek_resolves_to_local_monday() {
        // Wednesday 2026-10-21 10:00 local
        let now = utc(2026, 10, 21, 2, 0);
        let w = WeekWindows::resolve(now);
        assert_eq!(w.this_week.start, utc(2026, 10, 18, 16, 0));
        assert_eq!(w.this_week.end, Some(now));
        assert_eq!(w.last_week.start, utc(2026, 10, 11, 16, 0));
        assert_eq!(w.last_week.end, Some(utc(2026, 10, 18, 16, 0)));
        assert_eq!(w.this_week_key.to_string(), "2026-W43");
        assert_eq!(w.last_week_key.to_string(), "2026-W42");
    }

    #[test]
    fn sunday_evening_utc_is_already_monday_locally() {
        // Sunday 2026-10-18 17:00 UTC is Monday 01:00 in UTC+8
        let now = utc(2026, 10, 18, 17, 0);
        let w = WeekWindows::resolve(now);
        assert_eq!(w.this_week.start, utc(2026, 10, 18, 16, 0));
    }

    #[test]
    fn exact_boundary_starts_new_week() {
        let boundary = utc(2026, 10, 18, 16, 0);
        let w = WeekWindows::resolve(boundary);
        assert_eq!(w.this_week.start, boundary);
        assert_eq!(w.last_week.end, Some(boundary));
        assert!(!w.this_week.contains(boundary));
        assert!(w.last_week.contains(boundary - Duration::seconds(1)));

        let just_before = WeekWindows::resolve(boundary - Duration::seconds(1));
        assert_eq!(just_before.this_week.start, utc(2026, 10, 11, 16, 0));
    }

    #[test]
    fn week_key_spans_year_boundary() {
        // Monday 2027-01-04 local; previous week starts Monday 2026-12-28
        let now = utc(2027, 1, 4, 1, 0);
        let w = WeekWindows::resolve(now);
        assert_eq!(w.this_week_key.to_string(), "2027-W01");
        assert_eq!(w.last_week_key.to_string(), "2026-W53");
    }

    #[test]
    fn open_window_contains_everything_after_start() {
        let w = TimeWindow {
            start: utc(2026, 1, 1, 0, 0),
            end: None,
        };
        assert!(w.contains(utc(2030, 1, 1, 0, 0)));
        assert!(!w.contains(utc(2025, 12, 31, 23, 59)));
    }
}
