//! Civil-time helpers. Households live on a fixed UTC+8 calendar; all stored
//! timestamps are UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

pub const LOCAL_UTC_OFFSET_SECS: i32 = 8 * 3600;

pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_UTC_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

/// Calendar date of `instant` in the household's civil calendar.
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&local_offset()).date_naive()
}

/// UTC instant at which the given local calendar day begins.
pub fn local_midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    (date.and_time(NaiveTime::MIN) - Duration::seconds(LOCAL_UTC_OFFSET_SECS as i64)).and_utc()
}

/// Start of "today" (local midnight) as a UTC instant.
pub fn today_start_utc(now: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight_utc(local_date(now))
}

/// Short human form of a past timestamp: "just now", "5 min ago", "3 h ago",
/// and `MM-DD HH:MM` (local) once a full day has passed.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - then;
    if diff.num_days() > 0 {
        return then.with_timezone(&local_offset()).format("%m-%d %H:%M").to_string();
    }

    let secs = diff.num_seconds();
    if secs < 3600 {
        let mins = secs.max(0) / 60;
        if mins == 0 {
            "just now".to_string()
        } else {
            format!("{} min ago", mins)
        }
    } else {
        format!("{} h ago", secs / 3600)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Age {
    pub years: u32,
    pub months: u32,
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.years, self.months) {
            (0, m) => write!(f, "{}m", m),
            (y, 0) => write!(f, "{}y", y),
            (y, m) => write!(f, "{}y {}m", y, m),
        }
    }
}

/// Completed years and months between `birth` and `today`. `None` for future
/// birthdates.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<Age> {
    if birth > today {
        return None;
    }

    let mut months = (today.year() - birth.year()) * 12 + today.month() as i32 - birth.month() as i32;
    if today.day() < birth.day() {
        months -= 1;
    }
    let months = months.max(0) as u32;

    Some(Age {
        years: months / 12,
        months: months % 12,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn local_date_rolls_over_at_16_utc() {
        assert_eq!(local_date(utc(2026, 10, 18, 15, 59)), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(local_date(utc(2026, 10, 18, 16, 0)), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[test]
    fn today_starts_at_local_midnight() {
        let now = utc(2026, 10, 19, 3, 30);
        assert_eq!(today_start_utc(now), utc(2026, 10, 18, 16, 0));
    }

    #[rstest]
    #[case(20, "just now")]
    #[case(5 * 60 + 10, "5 min ago")]
    #[case(3 * 3600 + 5, "3 h ago")]
    #[case(-30, "just now")]
    fn relative_time(#[case] seconds_ago: i64, #[case] expected: &str) {
        let now = utc(2026, 10, 19, 12, 0);
        let then = now - Duration::seconds(seconds_ago);
        assert_eq!(format_relative(then, now), expected);
    }

    #[test]
    fn relative_time_falls_back_to_local_date() {
        let now = utc(2026, 10, 19, 12, 0);
        let then = utc(2026, 10, 17, 23, 15);
        assert_eq!(format_relative(then, now), "10-18 07:15");
    }

    #[test]
    fn age_counts_completed_months() {
        let birth = NaiveDate::from_ymd_opt(2023, 5, 20).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(age_on(birth, today), Some(Age { years: 3, months: 4 }));
        assert_eq!(age_on(birth, today).unwrap().to_string(), "3y 4m");
    }

    #[test]
    fn age_of_unborn_pet_is_none() {
        let birth = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(age_on(birth, today), None);
    }

    #[test]
    fn young_pet_reports_months_only() {
        let birth = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(age_on(birth, today).unwrap().to_string(), "2m");
    }
}
