//! Holiday lookups backed by a per-year cache of an external calendar feed.
//!
//! A year is fetched once, on first access, and kept. When the feed cannot be
//! reached the oracle falls back to treating Saturdays and Sundays as the only
//! days off; the next access to that year tries the feed again.

mod taiwan_calendar;

pub use taiwan_calendar::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{HolidayCacheEntry, HolidayCategory, HolidayInfo, MonthCalendar};
use crate::scheduling::YearMonth;

/// Errors from fetching a year of holiday data.
#[derive(Debug, thiserror::Error)]
pub enum HolidayError {
    #[error("holiday feed request failed")]
    Request(#[from] reqwest::Error),

    #[error("holiday data for {0} is not published yet")]
    NotPublished(i32),

    #[error("holiday feed returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("holiday feed payload is invalid: {0}")]
    Parse(String),

    #[error("holiday feed did not answer within {0:?}")]
    Timeout(Duration),
}

/// Supplier of a full year of calendar facts.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn fetch_year(&self, year: i32) -> Result<Vec<HolidayCacheEntry>, HolidayError>;
}

/// Whether a date is a day off, and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStatus {
    pub is_holiday: bool,
    /// Display name; empty for an ordinary working day
    pub name: String,
}

impl DayStatus {
    /// Decide a date from its cache entry, if any.
    ///
    /// A cached entry is authoritative, so a make-up working Saturday is not a
    /// holiday. Without an entry only weekends are days off.
    pub fn resolve(date: NaiveDate, entry: Option<&HolidayCacheEntry>) -> Self {
        let weekend = weekend_name(date);
        let is_holiday = match entry {
            Some(entry) => entry.is_official_holiday,
            None => weekend.is_some(),
        };

        let name = match (entry, weekend) {
            (Some(entry), _)
                if entry.is_official_holiday && entry.category == HolidayCategory::National =>
            {
                entry.holiday_name.clone()
            }
            (_, Some(weekend)) => weekend.to_string(),
            (Some(entry), None) if entry.is_official_holiday => entry.holiday_name.clone(),
            _ => String::new(),
        };

        Self { is_holiday, name }
    }
}

/// `星期六` or `星期日` for weekend dates.
pub fn weekend_name(date: NaiveDate) -> Option<&'static str> {
    match date.weekday() {
        Weekday::Sat => Some("星期六"),
        Weekday::Sun => Some("星期日"),
        _ => None,
    }
}

/// Answers holiday questions from the cache, populating it on demand.
pub struct HolidayOracle {
    repo: Repository,
    source: Arc<dyn HolidaySource>,
    fetch_timeout: Duration,
}

impl HolidayOracle {
    pub fn new(repo: Repository, source: Arc<dyn HolidaySource>, fetch_timeout: Duration) -> Self {
        Self {
            repo,
            source,
            fetch_timeout,
        }
    }

    /// Make sure `year` is cached. Idempotent; failures are logged and swallowed.
    pub async fn ensure_year_cached(&self, year: i32) {
        match self.repo.holiday_year_as_of(year).await {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Holiday cache lookup for {} failed: {}", year, e);
                return;
            }
        }

        tracing::info!("Fetching holiday calendar for {}", year);
        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch_year(year))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(HolidayError::Timeout(self.fetch_timeout)),
        };

        match fetched {
            Ok(entries) if entries.is_empty() => {
                tracing::warn!("Holiday feed returned no days for {}", year);
            }
            Ok(entries) => match self.repo.insert_holidays(&entries).await {
                Ok(inserted) => {
                    tracing::info!("Cached {} holiday entries for {}", inserted, year)
                }
                Err(e) => tracing::warn!("Failed to cache holidays for {}: {}", year, e),
            },
            Err(e) => {
                tracing::warn!(
                    "Holiday feed unavailable for {}, using weekends only: {}",
                    year,
                    e
                );
            }
        }
    }

    /// Holiday status and display name of a date.
    pub async fn day_status(&self, date: NaiveDate) -> Result<DayStatus, AppError> {
        self.ensure_year_cached(date.year()).await;
        self.cached_day_status(date).await
    }

    /// Like [`day_status`](Self::day_status) but never contacts the feed.
    ///
    /// Callers resolving many dates of one year call
    /// [`ensure_year_cached`](Self::ensure_year_cached) once beforehand.
    pub async fn cached_day_status(&self, date: NaiveDate) -> Result<DayStatus, AppError> {
        let entry = self.repo.holiday_entry(date).await?;
        Ok(DayStatus::resolve(date, entry.as_ref()))
    }

    /// Official days off within a month.
    pub async fn month_holidays(&self, month: YearMonth) -> Result<Vec<HolidayInfo>, AppError> {
        self.ensure_year_cached(month.year).await;
        let entries = self.repo.cached_month_holidays(month).await?;
        Ok(entries
            .into_iter()
            .map(|entry| HolidayInfo {
                date: entry.holiday_date,
                name: entry.holiday_name,
            })
            .collect())
    }

    /// Calendar data for rendering a month.
    pub async fn month_calendar(&self, month: YearMonth) -> Result<MonthCalendar, AppError> {
        let holidays = self.month_holidays(month).await?;
        let weekends = month
            .days()
            .filter(|date| weekend_name(*date).is_some())
            .collect();
        let cached_as_of = self.repo.holiday_year_as_of(month.year).await?;

        Ok(MonthCalendar {
            year: month.year,
            month: month.month,
            holidays,
            weekends,
            total_days: month.days_in_month(),
            cached_as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(
        day: NaiveDate,
        name: &str,
        category: HolidayCategory,
        official: bool,
    ) -> HolidayCacheEntry {
        HolidayCacheEntry {
            holiday_date: day,
            holiday_name: name.to_string(),
            category,
            description: None,
            is_official_holiday: official,
            cache_year: day.year(),
            last_updated_from_api: Utc::now(),
        }
    }

    #[test]
    fn test_weekend_fallback_without_cache() {
        // 2026-02-07 is a Saturday, 2026-02-08 a Sunday
        let sat = DayStatus::resolve(date(2026, 2, 7), None);
        assert!(sat.is_holiday);
        assert_eq!(sat.name, "星期六");

        let sun = DayStatus::resolve(date(2026, 2, 8), None);
        assert_eq!(sun.name, "星期日");

        let mon = DayStatus::resolve(date(2026, 2, 9), None);
        assert!(!mon.is_holiday);
        assert_eq!(mon.name, "");
    }

    #[test]
    fn test_national_holiday_name_wins() {
        let day = date(2026, 2, 17);
        let status = DayStatus::resolve(
            day,
            Some(&entry(day, "春節", HolidayCategory::National, true)),
        );
        assert!(status.is_holiday);
        assert_eq!(status.name, "春節");
    }

    #[test]
    fn test_cached_workday_overrides_weekend() {
        // Make-up working Saturday
        let day = date(2026, 2, 7);
        let status = DayStatus::resolve(
            day,
            Some(&entry(day, "補行上班", HolidayCategory::Weekend, false)),
        );
        assert!(!status.is_holiday);
        assert_eq!(status.name, "星期六");
    }

    #[test]
    fn test_weekday_rest_day_uses_entry_name() {
        let day = date(2026, 2, 20);
        let status = DayStatus::resolve(
            day,
            Some(&entry(day, "調整放假", HolidayCategory::Weekend, true)),
        );
        assert!(status.is_holiday);
        assert_eq!(status.name, "調整放假");
    }
}
