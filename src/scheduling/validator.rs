//! Shift validation rules.
//!
//! Each rule is a small function over already-gathered facts so it can be
//! exercised at its boundary in isolation. [`ShiftValidator::validate`]
//! gathers the facts from the store and runs the rules in their fixed order,
//! stopping at the first rejection; the order decides which message the
//! user sees.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use super::{open_scheduling_month, SchedulingPolicy, YearMonth};
use crate::db::shifts;
use crate::errors::AppError;
use crate::holidays::DayStatus;
use crate::models::UserId;

/// Message returned when every rule passes.
pub const VALIDATION_PASSED: &str = "驗證成功";

/// Why a scheduling request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("無法排班: {name}")]
    Holiday { name: String },

    #[error("只開放 {} 的排班", .open.long_label())]
    OutsideWindow { open: YearMonth },

    #[error("已達月度上限 {max} 天")]
    MonthlyCapReached { max: i64 },

    #[error("該日期已滿額 ({max}人)")]
    DailyCapReached { max: i64 },

    #[error("您已在此日期排班")]
    AlreadyScheduled,

    /// Insert lost a race the pre-checks could not see.
    #[error("該員工已在此日期排班")]
    ScheduleConflict,

    #[error("未找到排班記錄")]
    NotFound,

    #[error("每月排班必須在 {min} 至 {max} 天之間")]
    DayCountOutOfRange { min: i64, max: i64 },

    #[error("目前僅開放 {open} 的排班")]
    MonthClosed { open: YearMonth },

    #[error("{} 不在 {month} 範圍內", .date.format("%m/%d"))]
    OutsideBatchMonth { date: NaiveDate, month: YearMonth },

    #[error("{} 是假日/週末，不可排班", .date.format("%m/%d"))]
    BatchHoliday { date: NaiveDate },

    #[error("{} 班次已滿 (限{max}人)", .date.format("%m/%d"))]
    BatchDayFull { date: NaiveDate, max: i64 },

    #[error("{} 重複選取", .date.format("%m/%d"))]
    DuplicateInBatch { date: NaiveDate },
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::NotFound => AppError::NotFound(rejection.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// Outcome of a rule check: `Ok(())` to continue, `Err` to refuse.
pub type Verdict = Result<(), Rejection>;

/// Applies the scheduling rules under a fixed policy.
#[derive(Debug, Clone)]
pub struct ShiftValidator {
    policy: SchedulingPolicy,
}

impl ShiftValidator {
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Rule 1: no shifts on holidays or weekends.
    pub fn check_holiday(day: &DayStatus) -> Verdict {
        if day.is_holiday {
            return Err(Rejection::Holiday {
                name: day.name.clone(),
            });
        }
        Ok(())
    }

    /// Rule 2: only the month after `today` is open.
    pub fn check_window(date: NaiveDate, today: NaiveDate) -> Verdict {
        let open = open_scheduling_month(today);
        if !open.contains(date) {
            return Err(Rejection::OutsideWindow { open });
        }
        Ok(())
    }

    /// Rule 3: the user's month is not already full.
    pub fn check_monthly_cap(&self, monthly_count: i64) -> Verdict {
        if monthly_count >= self.policy.max_days_per_month {
            return Err(Rejection::MonthlyCapReached {
                max: self.policy.max_days_per_month,
            });
        }
        Ok(())
    }

    /// Rule 4: the date still has room.
    pub fn check_daily_cap(&self, daily_count: i64) -> Verdict {
        if daily_count >= self.policy.max_staff_per_day {
            return Err(Rejection::DailyCapReached {
                max: self.policy.max_staff_per_day,
            });
        }
        Ok(())
    }

    /// Rule 5: the user does not already hold the date.
    pub fn check_duplicate(already_scheduled: bool) -> Verdict {
        if already_scheduled {
            return Err(Rejection::AlreadyScheduled);
        }
        Ok(())
    }

    /// Run all rules against live counts read through `conn`.
    ///
    /// Storage faults are returned as `Err`; rule failures as `Ok(Err(_))`.
    pub async fn validate(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        date: NaiveDate,
        day: &DayStatus,
        today: NaiveDate,
    ) -> Result<Verdict, AppError> {
        if let Err(rejection) = Self::check_holiday(day) {
            return Ok(Err(rejection));
        }
        if let Err(rejection) = Self::check_window(date, today) {
            return Ok(Err(rejection));
        }

        let monthly = shifts::count_user_month(&mut *conn, user_id, YearMonth::of(date)).await?;
        if let Err(rejection) = self.check_monthly_cap(monthly) {
            return Ok(Err(rejection));
        }

        let daily = shifts::count_on_date(&mut *conn, date).await?;
        if let Err(rejection) = self.check_daily_cap(daily) {
            return Ok(Err(rejection));
        }

        let exists = shifts::exists(&mut *conn, user_id, date).await?;
        Ok(Self::check_duplicate(exists))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn workday() -> DayStatus {
        DayStatus {
            is_holiday: false,
            name: String::new(),
        }
    }

    #[test]
    fn test_holiday_rejection_names_the_day() {
        let day = DayStatus {
            is_holiday: true,
            name: "星期六".to_string(),
        };
        let err = ShiftValidator::check_holiday(&day).unwrap_err();
        assert_eq!(err.to_string(), "無法排班: 星期六");
        assert!(ShiftValidator::check_holiday(&workday()).is_ok());
    }

    #[test]
    fn test_window_accepts_only_next_month() {
        let today = date(2026, 1, 15);
        assert!(ShiftValidator::check_window(date(2026, 2, 1), today).is_ok());
        assert!(ShiftValidator::check_window(date(2026, 2, 28), today).is_ok());

        let err = ShiftValidator::check_window(date(2026, 1, 20), today).unwrap_err();
        assert_eq!(err.to_string(), "只開放 2026年02月 的排班");
        assert!(ShiftValidator::check_window(date(2026, 3, 2), today).is_err());
        assert!(ShiftValidator::check_window(date(2027, 2, 2), today).is_err());
    }

    #[test]
    fn test_monthly_cap_boundary() {
        let validator = ShiftValidator::new(SchedulingPolicy::default());
        assert!(validator.check_monthly_cap(14).is_ok());
        assert_eq!(
            validator.check_monthly_cap(15).unwrap_err().to_string(),
            "已達月度上限 15 天"
        );
    }

    #[test]
    fn test_daily_cap_boundary_uses_policy() {
        let validator = ShiftValidator::new(SchedulingPolicy::default());
        assert!(validator.check_daily_cap(1).is_ok());
        assert_eq!(
            validator.check_daily_cap(2).unwrap_err().to_string(),
            "該日期已滿額 (2人)"
        );

        let roomy = ShiftValidator::new(SchedulingPolicy {
            max_staff_per_day: 3,
            ..SchedulingPolicy::default()
        });
        assert!(roomy.check_daily_cap(2).is_ok());
    }

    #[test]
    fn test_duplicate_check() {
        assert!(ShiftValidator::check_duplicate(false).is_ok());
        assert_eq!(
            ShiftValidator::check_duplicate(true).unwrap_err(),
            Rejection::AlreadyScheduled
        );
    }

    #[test]
    fn test_batch_messages_name_the_date() {
        let d = date(2026, 2, 7);
        assert_eq!(
            Rejection::BatchHoliday { date: d }.to_string(),
            "02/07 是假日/週末，不可排班"
        );
        assert_eq!(
            Rejection::BatchDayFull { date: d, max: 2 }.to_string(),
            "02/07 班次已滿 (限2人)"
        );
        assert_eq!(
            Rejection::MonthClosed {
                open: YearMonth::new(2026, 2).unwrap()
            }
            .to_string(),
            "目前僅開放 2026/02 的排班"
        );
    }

    #[test]
    fn test_not_found_maps_to_not_found_error() {
        assert!(matches!(
            AppError::from(Rejection::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(Rejection::ScheduleConflict),
            AppError::Validation(_)
        ));
    }
}
