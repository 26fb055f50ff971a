//! Reporting views over the shift records.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Employee, UserId};

/// An employee scheduled on a given day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftedEmployee {
    pub user_id: UserId,
    pub full_name: String,
    pub shift_date: NaiveDate,
}

/// One day of the monthly overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub day_of_month: u32,
    /// 0 = Sunday ... 6 = Saturday
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub holiday_name: String,
    pub shifted_employees: Vec<ShiftedEmployee>,
    pub current_shift_count: usize,
}

/// Manager's month-at-a-glance view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySchedule {
    pub year: i32,
    pub month: u32,
    pub employees: Vec<Employee>,
    pub day_schedules: Vec<DaySchedule>,
    pub total_days: u32,
}

/// One row of the monthly leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: UserId,
    pub full_name: String,
    pub shift_days: i64,
    pub is_compliant: bool,
    pub compliance_percentage: f64,
}

/// Yearly totals for one employee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeYearlyStats {
    pub user_id: UserId,
    pub full_name: String,
    pub total_yearly_shifts: i64,
    pub average_monthly_shifts: f64,
    /// Month (1-12) to shift days
    pub monthly_breakdown: BTreeMap<u32, i64>,
    pub average_compliance_percentage: f64,
}

/// Single employee's month count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeMonthlyCount {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub shift_days: i64,
    pub is_compliant: bool,
    pub min_required: i64,
    pub max_allowed: i64,
}

/// Single employee's year count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeYearlyCount {
    pub user_id: UserId,
    pub year: i32,
    pub total_shift_days: i64,
    pub average_monthly_shifts: f64,
}

/// Persisted statistics snapshot; `stat_month` is `None` for the yearly row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStatistic {
    pub user_id: UserId,
    pub stat_year: i32,
    pub stat_month: Option<u32>,
    pub total_shift_days: i64,
    pub last_calculated_at: DateTime<Utc>,
}
