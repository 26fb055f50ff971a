//! Shift record model and the request/response shapes of the shift API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Lifecycle state of a shift claim.
///
/// Records are only ever created as `Pending`; the column exists so an
/// approval workflow can add states without a schema change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShiftStatus {
    Pending,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Pending => "Pending",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(ShiftStatus::Pending),
            _ => None,
        }
    }
}

/// One employee's claim on one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    pub shift_id: i64,
    pub user_id: UserId,
    pub shift_date: NaiveDate,
    pub status: ShiftStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for adding or removing a single shift.
///
/// `targetUserId` lets a manager act on someone else's schedule; employees
/// omit it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleShiftRequest {
    pub shift_date: String,
    #[serde(default)]
    pub target_user_id: Option<UserId>,
}

/// Request body for replacing a whole month of shifts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkShiftRequest {
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM-DD` strings
    pub shift_dates: Vec<String>,
    #[serde(default)]
    pub target_user_id: Option<UserId>,
}

/// Query parameters selecting whose schedule to read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSelector {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A user's progress towards the monthly day-count bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProgress {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub current_shifts: i64,
    pub existing_dates: Vec<NaiveDate>,
    pub min_required: i64,
    pub max_allowed: i64,
    pub is_compliant: bool,
}

/// Pending occupancy of a single date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOccupancy {
    pub date: NaiveDate,
    pub count: i64,
    pub capacity: i64,
}

/// Dry-run validation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub valid: bool,
    pub reason: String,
}
