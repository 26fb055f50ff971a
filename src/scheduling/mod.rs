//! Scheduling rules: limits, the open scheduling window and the validator.
//!
//! The window is always the calendar month after "today". Today is read
//! through a [`Clock`] at the moment a request is evaluated, so the window
//! rolls forward with real time and tests can pin it.

mod service;
mod validator;

pub use service::*;
pub use validator::*;

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{Datelike, Local, NaiveDate};

/// Day-count and staffing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingPolicy {
    /// Fewest shifts a bulk submission may contain
    pub min_days_per_month: i64,
    /// Most shifts a user may hold in one month
    pub max_days_per_month: i64,
    /// Most users that may be scheduled on one date
    pub max_staff_per_day: i64,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            min_days_per_month: 6,
            max_days_per_month: 15,
            max_staff_per_day: 2,
        }
    }
}

impl SchedulingPolicy {
    /// Whether a monthly count falls within the required bounds.
    pub fn is_compliant(&self, count: i64) -> bool {
        count >= self.min_days_per_month && count <= self.max_days_per_month
    }
}

/// Years accepted wherever a month, year or date enters from a request.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

/// A calendar month.
///
/// Months built through [`YearMonth::new`], [`YearMonth::of`] on a date from
/// the supported years, or [`YearMonth::next`] of those, are always
/// representable as dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Build a month, rejecting month numbers outside 1-12 and years outside
    /// [`SUPPORTED_YEARS`].
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !SUPPORTED_YEARS.contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    /// January of `year`; `None` outside [`SUPPORTED_YEARS`].
    pub fn january(year: i32) -> Option<Self> {
        Self::new(year, 1)
    }

    /// January of the same year.
    pub fn start_of_year(self) -> Self {
        Self {
            year: self.year,
            month: 1,
        }
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following calendar month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The same month one year later.
    pub fn next_year(self) -> Self {
        Self {
            year: self.year + 1,
            month: self.month,
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("YearMonth is constructed within the representable date range")
    }

    /// Exclusive upper bound for range queries.
    pub fn first_day_of_next(self) -> NaiveDate {
        self.next().first_day()
    }

    pub fn days_in_month(self) -> u32 {
        (self.first_day_of_next() - self.first_day()).num_days() as u32
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::of(date) == self
    }

    /// Every date of the month in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.first_day()
            .iter_days()
            .take(self.days_in_month() as usize)
    }

    /// `2026年02月`, as used in window rejection messages.
    pub fn long_label(self) -> String {
        format!("{}年{:02}月", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.month)
    }
}

/// The single month open for new shift claims, relative to `today`.
pub fn open_scheduling_month(today: NaiveDate) -> YearMonth {
    YearMonth::of(today).next()
}

/// Source of "today" for window checks.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in the server's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_open_month_is_next_calendar_month() {
        assert_eq!(
            open_scheduling_month(date(2026, 1, 15)),
            YearMonth::new(2026, 2).unwrap()
        );
        assert_eq!(
            open_scheduling_month(date(2026, 1, 31)),
            YearMonth::new(2026, 2).unwrap()
        );
    }

    #[test]
    fn test_open_month_rolls_over_year() {
        assert_eq!(
            open_scheduling_month(date(2026, 12, 1)),
            YearMonth::new(2027, 1).unwrap()
        );
    }

    #[test]
    fn test_year_month_bounds() {
        let feb = YearMonth::new(2028, 2).unwrap();
        assert_eq!(feb.days_in_month(), 29);
        assert_eq!(feb.first_day_of_next(), date(2028, 3, 1));
        assert!(feb.contains(date(2028, 2, 29)));
        assert!(!feb.contains(date(2028, 3, 1)));
        assert_eq!(feb.days().count(), 29);
        assert_eq!(feb.to_string(), "2028/02");
        assert_eq!(feb.long_label(), "2028年02月");

        assert!(YearMonth::new(2026, 13).is_none());
        assert!(YearMonth::new(2026, 0).is_none());
    }

    #[test]
    fn test_year_month_rejects_unsupported_years() {
        assert!(YearMonth::new(0, 1).is_none());
        assert!(YearMonth::new(10000, 1).is_none());
        assert!(YearMonth::new(i32::MAX, 12).is_none());
        assert!(YearMonth::january(i32::MIN).is_none());

        let last = YearMonth::new(9999, 12).unwrap();
        assert_eq!(last.days_in_month(), 31);
        assert_eq!(last.first_day_of_next(), date(10000, 1, 1));
        assert_eq!(last.next().first_day(), date(10000, 1, 1));
    }

    #[test]
    fn test_policy_compliance_bounds() {
        let policy = SchedulingPolicy::default();
        assert!(!policy.is_compliant(5));
        assert!(policy.is_compliant(6));
        assert!(policy.is_compliant(15));
        assert!(!policy.is_compliant(16));
    }
}
