//! Recurring dates on either the Gregorian or the Chinese lunisolar calendar.
//!
//! Lunar years are encoded one word per year starting at lunar 2000 (new year on
//! 2000-02-05):
//! - bits 4..=15: month lengths, bit 15 = month 1, set = 30 days, clear = 29
//! - bits 0..=3: leap month number, 0 when the year has none
//! - bit 16: leap month length, set = 30 days

use chrono::{Datelike, Duration, NaiveDate};

const FIRST_LUNAR_YEAR: i32 = 2000;

const LUNAR_YEARS: [u32; 50] = [
    0x0c960, 0x0d954, 0x0d4a0, 0x0da50, 0x07552, 0x056a0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5,
    0x0a950, 0x0b4a0, 0x0baa4, 0x0ad50, 0x055d9, 0x04ba0, 0x0a5b0, 0x15176, 0x052b0, 0x0a930,
    0x07954, 0x06aa0, 0x0ad50, 0x05b52, 0x04b60, 0x0a6e6, 0x0a4e0, 0x0d260, 0x0ea65, 0x0d530,
    0x05aa0, 0x076a3, 0x096d0, 0x04afb, 0x04ad0, 0x0a4d0, 0x1d0b6, 0x0d250, 0x0d520, 0x0dd45,
    0x0b5a0, 0x056d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0aa50, 0x1b255, 0x06d20, 0x0ada0,
];

fn year_info(year: i32) -> Option<u32> {
    let idx = usize::try_from(year - FIRST_LUNAR_YEAR).ok()?;
    LUNAR_YEARS.get(idx).copied()
}

fn new_year_2000() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 2, 5).expect("valid anchor date")
}

fn leap_month(info: u32) -> u32 {
    info & 0xf
}

fn month_days(info: u32, month: u32) -> i64 {
    if info & (0x10000 >> month) != 0 {
        30
    } else {
        29
    }
}

fn leap_month_days(info: u32) -> i64 {
    match leap_month(info) {
        0 => 0,
        _ if info & 0x10000 != 0 => 30,
        _ => 29,
    }
}

fn year_days(info: u32) -> i64 {
    (1..=12).map(|m| month_days(info, m)).sum::<i64>() + leap_month_days(info)
}

/// Gregorian date of lunar `year`-`month`-`day` (regular, non-leap month).
///
/// A day 30 in a 29-day month falls back to day 29. Returns `None` outside the
/// supported lunar years 2000–2049 or for out-of-range month/day.
pub fn lunar_to_solar(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) || !(1..=30).contains(&day) {
        return None;
    }
    let info = year_info(year)?;

    let mut offset: i64 = (FIRST_LUNAR_YEAR..year)
        .map(|y| year_info(y).map(year_days).unwrap_or(0))
        .sum();

    for m in 1..month {
        offset += month_days(info, m);
        if leap_month(info) == m {
            offset += leap_month_days(info);
        }
    }

    let day = (day as i64).min(month_days(info, month));
    Some(new_year_2000() + Duration::days(offset + day - 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Solar { month: u32, day: u32 },
    Lunar { month: u32, day: u32 },
}

/// First date on or after `today` on which the recurrence falls.
///
/// Feb 29 falls on Feb 28 in common years.
pub fn next_occurrence(recurrence: Recurrence, today: NaiveDate) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::Solar { month, day } => (today.year()..=today.year() + 1)
            .filter_map(|y| solar_in_year(y, month, day))
            .find(|d| *d >= today),
        Recurrence::Lunar { month, day } => (today.year() - 1..=today.year() + 1)
            .filter_map(|y| lunar_to_solar(y, month, day))
            .find(|d| *d >= today),
    }
}

fn solar_in_year(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        if month == 2 && day == 29 {
            NaiveDate::from_ymd_opt(year, 2, 28)
        } else {
            None
        }
    })
}

/// Whole days from `today` until `date`.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(2000, ymd(2000, 2, 5))]
    #[case(2023, ymd(2023, 1, 22))]
    #[case(2024, ymd(2024, 2, 10))]
    #[case(2025, ymd(2025, 1, 29))]
    #[case(2026, ymd(2026, 2, 17))]
    #[case(2049, ymd(2049, 2, 2))]
    fn lunar_new_year(#[case] year: i32, #[case] expected: NaiveDate) {
        assert_eq!(lunar_to_solar(year, 1, 1), Some(expected));
    }

    #[rstest]
    #[case(2023, 8, 15, ymd(2023, 9, 29))]
    #[case(2024, 8, 15, ymd(2024, 9, 17))]
    #[case(2025, 8, 15, ymd(2025, 10, 6))]
    #[case(2025, 5, 5, ymd(2025, 5, 31))]
    #[case(2026, 1, 15, ymd(2026, 3, 3))]
    fn lunar_festivals(#[case] y: i32, #[case] m: u32, #[case] d: u32, #[case] expected: NaiveDate) {
        assert_eq!(lunar_to_solar(y, m, d), Some(expected));
    }

    #[test]
    fn unsupported_years_are_none() {
        assert_eq!(lunar_to_solar(1999, 1, 1), None);
        assert_eq!(lunar_to_solar(2050, 1, 1), None);
        assert_eq!(lunar_to_solar(2025, 13, 1), None);
    }

    #[test]
    fn solar_occurrence_rolls_to_next_year() {
        let today = ymd(2026, 10, 19);
        let birthday = Recurrence::Solar { month: 3, day: 8 };
        assert_eq!(next_occurrence(birthday, today), Some(ymd(2027, 3, 8)));

        let same_day = Recurrence::Solar { month: 10, day: 19 };
        assert_eq!(next_occurrence(same_day, today), Some(today));
    }

    #[test]
    fn leap_day_falls_back_in_common_years() {
        let today = ymd(2026, 10, 19);
        let leap_day = Recurrence::Solar { month: 2, day: 29 };
        assert_eq!(next_occurrence(leap_day, today), Some(ymd(2027, 2, 28)));
    }

    #[test]
    fn lunar_occurrence_uses_current_lunar_year() {
        // lunar 2025-08-15 was 2025-10-06; the next one is in lunar 2026
        let after = ymd(2025, 10, 7);
        let mid_autumn = Recurrence::Lunar { month: 8, day: 15 };
        let next = next_occurrence(mid_autumn, after).unwrap();
        assert!(next > after);
        assert_eq!(next, lunar_to_solar(2026, 8, 15).unwrap());

        // a late-December date can still belong to the previous lunar year
        let winter = ymd(2025, 1, 10);
        let late_lunar = Recurrence::Lunar { month: 12, day: 20 };
        assert_eq!(next_occurrence(late_lunar, winter), lunar_to_solar(2024, 12, 20));
    }

    #[test]
    fn days_until_counts_whole_days() {
        assert_eq!(days_until(ymd(2026, 10, 25), ymd(2026, 10, 19)), 6);
    }
}
