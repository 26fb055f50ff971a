//! Client for the Taiwan government calendar mirror.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{HolidayError, HolidaySource};
use crate::models::{HolidayCacheEntry, HolidayCategory};

const CLIENT_USER_AGENT: &str = concat!("shift-backend/", env!("CARGO_PKG_VERSION"));

/// Name used when the feed marks a day off without naming it.
const UNNAMED_HOLIDAY: &str = "假日";

#[derive(Debug, Deserialize)]
struct CalendarYear {
    #[serde(default)]
    months: Vec<CalendarMonth>,
}

#[derive(Debug, Deserialize)]
struct CalendarMonth {
    #[serde(default)]
    holidays: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    /// `YYYYMMDD`
    date: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_holiday: bool,
    #[serde(default)]
    is_special_holiday: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Fetches `{year}/all.json` from the calendar mirror.
pub struct TaiwanCalendarSource {
    client: Client,
    url_template: String,
}

impl TaiwanCalendarSource {
    /// `url_template` must contain `{year}`.
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, HolidayError> {
        // GitHub Pages rejects requests without a User-Agent
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(CLIENT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    fn url_for(&self, year: i32) -> String {
        self.url_template.replace("{year}", &year.to_string())
    }
}

#[async_trait]
impl HolidaySource for TaiwanCalendarSource {
    async fn fetch_year(&self, year: i32) -> Result<Vec<HolidayCacheEntry>, HolidayError> {
        let url = self.url_for(year);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(HolidayError::NotPublished(year)),
            status if !status.is_success() => return Err(HolidayError::Status(status)),
            _ => {}
        }

        let body = response.text().await?;
        parse_calendar(year, &body, Utc::now())
    }
}

/// Convert a feed payload into cache entries stamped with `fetched_at`.
///
/// Days with malformed dates are skipped. Every listed day is kept, including
/// make-up working days, so the cache can override the weekend rule both ways.
pub fn parse_calendar(
    year: i32,
    body: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<HolidayCacheEntry>, HolidayError> {
    let calendar: CalendarYear =
        serde_json::from_str(body).map_err(|e| HolidayError::Parse(e.to_string()))?;

    let mut entries = Vec::new();
    for day in calendar.months.into_iter().flat_map(|m| m.holidays) {
        let Ok(date) = NaiveDate::parse_from_str(&day.date, "%Y%m%d") else {
            tracing::debug!("Skipping holiday with malformed date {:?}", day.date);
            continue;
        };

        let name = if day.name.trim().is_empty() {
            UNNAMED_HOLIDAY.to_string()
        } else {
            day.name
        };

        entries.push(HolidayCacheEntry {
            holiday_date: date,
            holiday_name: name,
            category: if day.is_special_holiday {
                HolidayCategory::National
            } else {
                HolidayCategory::Weekend
            },
            description: day.description.filter(|d| !d.is_empty()),
            is_official_holiday: day.is_holiday,
            cache_year: year,
            last_updated_from_api: fetched_at,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "year": 2026,
        "months": [
            {
                "month": 2,
                "holidays": [
                    {"date": "20260207", "name": "", "isHoliday": true, "isSpecialHoliday": false, "description": ""},
                    {"date": "20260217", "name": "春節", "isHoliday": true, "isSpecialHoliday": true, "description": "農曆正月初一"},
                    {"date": "20260221", "name": "補行上班", "isHoliday": false, "isSpecialHoliday": false, "description": ""},
                    {"date": "2026-02-30", "name": "bad", "isHoliday": true, "isSpecialHoliday": false, "description": ""}
                ]
            },
            {"month": 3, "holidays": []}
        ]
    }"#;

    #[test]
    fn test_parse_calendar_maps_feed_fields() {
        let fetched_at = Utc::now();
        let entries = parse_calendar(2026, SAMPLE, fetched_at).unwrap();

        assert_eq!(entries.len(), 3);

        let weekend = &entries[0];
        assert_eq!(weekend.holiday_name, "假日");
        assert_eq!(weekend.category, HolidayCategory::Weekend);
        assert!(weekend.is_official_holiday);
        assert!(weekend.description.is_none());

        let new_year = &entries[1];
        assert_eq!(new_year.holiday_date, NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        assert_eq!(new_year.holiday_name, "春節");
        assert_eq!(new_year.category, HolidayCategory::National);
        assert_eq!(new_year.description.as_deref(), Some("農曆正月初一"));
        assert_eq!(new_year.cache_year, 2026);
        assert_eq!(new_year.last_updated_from_api, fetched_at);

        assert!(!entries[2].is_official_holiday);
    }

    #[test]
    fn test_parse_calendar_rejects_garbage() {
        let err = parse_calendar(2026, "<html>not json</html>", Utc::now()).unwrap_err();
        assert!(matches!(err, HolidayError::Parse(_)));
    }

    #[test]
    fn test_url_template_substitutes_year() {
        let source = TaiwanCalendarSource::new(
            "https://example.invalid/{year}/all.json",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(source.url_for(2027), "https://example.invalid/2027/all.json");
    }
}
