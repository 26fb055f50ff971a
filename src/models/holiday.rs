//! Holiday cache model and calendar view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a cached day off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HolidayCategory {
    /// Statutory holiday with its own name
    National,
    /// Regular weekend or weekend-adjacent rest day
    Weekend,
}

impl HolidayCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayCategory::National => "National",
            HolidayCategory::Weekend => "Weekend",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "National" => Some(HolidayCategory::National),
            "Weekend" => Some(HolidayCategory::Weekend),
            _ => None,
        }
    }
}

/// A cached fact about one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HolidayCacheEntry {
    pub holiday_date: NaiveDate,
    pub holiday_name: String,
    pub category: HolidayCategory,
    pub description: Option<String>,
    pub is_official_holiday: bool,
    pub cache_year: i32,
    /// As-of timestamp of the feed snapshot this entry came from
    pub last_updated_from_api: DateTime<Utc>,
}

/// A named day off within a month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HolidayInfo {
    pub date: NaiveDate,
    pub name: String,
}

/// Calendar data the scheduling UI renders for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub holidays: Vec<HolidayInfo>,
    pub weekends: Vec<NaiveDate>,
    pub total_days: u32,
    /// When the holiday data for this year was fetched; absent if the feed was unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_as_of: Option<DateTime<Utc>>,
}
