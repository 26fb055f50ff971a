//! Shift store operations.
//!
//! Holiday facts are resolved before any transaction opens, so a cache fill
//! never runs inside a scheduling write. Capacity checks and inserts then
//! share one [`UnitOfWork`](crate::db::UnitOfWork).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;

use super::{open_scheduling_month, Clock, Rejection, ShiftValidator, YearMonth, VALIDATION_PASSED};
use crate::auth::Actor;
use crate::db::{shifts, Completion, Repository};
use crate::errors::AppError;
use crate::holidays::{DayStatus, HolidayOracle};
use crate::models::{DailyOccupancy, MonthlyProgress, UserId, ValidationReport};

/// Result of a shift write that reached the business rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftOutcome {
    Scheduled,
    Removed,
    MonthSaved,
    Rejected(Rejection),
}

impl ShiftOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ShiftOutcome::Rejected(_))
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        match self {
            ShiftOutcome::Scheduled => "排班成功".to_string(),
            ShiftOutcome::Removed => "取消排班成功".to_string(),
            ShiftOutcome::MonthSaved => "整月排班儲存成功".to_string(),
            ShiftOutcome::Rejected(rejection) => rejection.to_string(),
        }
    }

    /// The success message, or the rejection as an error.
    pub fn into_result(self) -> Result<String, AppError> {
        match self {
            ShiftOutcome::Rejected(rejection) => Err(rejection.into()),
            other => Ok(other.message()),
        }
    }
}

impl Completion for ShiftOutcome {
    fn should_commit(&self) -> bool {
        self.is_success()
    }
}

/// Adds, removes and bulk-replaces shifts under the scheduling rules.
pub struct ShiftService {
    repo: Repository,
    holidays: Arc<HolidayOracle>,
    validator: ShiftValidator,
    clock: Arc<dyn Clock>,
}

impl ShiftService {
    pub fn new(
        repo: Repository,
        holidays: Arc<HolidayOracle>,
        validator: ShiftValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            holidays,
            validator,
            clock,
        }
    }

    // ==================== POINT OPERATIONS ====================

    /// Schedule one date for the actor or, for managers, another user.
    pub async fn add_shift(
        &self,
        actor: &Actor,
        target: Option<UserId>,
        date: NaiveDate,
    ) -> Result<ShiftOutcome, AppError> {
        let user_id = actor.resolve_target(target)?;
        let day = self.holidays.day_status(date).await?;
        let today = self.clock.today();

        let mut uow = self.repo.begin().await?;
        let outcome = self.insert_checked(uow.conn(), user_id, date, &day, today).await;
        let outcome = uow.finish(outcome).await?;

        match &outcome {
            ShiftOutcome::Rejected(rejection) => {
                tracing::info!("Shift for user {} on {} rejected: {}", user_id, date, rejection)
            }
            _ => tracing::info!("User {} scheduled on {} by {}", user_id, date, actor.user_id),
        }
        Ok(outcome)
    }

    async fn insert_checked(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        date: NaiveDate,
        day: &DayStatus,
        today: NaiveDate,
    ) -> Result<ShiftOutcome, AppError> {
        if let Err(rejection) = self
            .validator
            .validate(&mut *conn, user_id, date, day, today)
            .await?
        {
            return Ok(ShiftOutcome::Rejected(rejection));
        }

        match shifts::insert_pending(&mut *conn, user_id, date, Utc::now()).await {
            Ok(_) => Ok(ShiftOutcome::Scheduled),
            Err(e) if shifts::is_unique_violation(&e) || shifts::is_write_conflict(&e) => {
                tracing::debug!("Insert for user {} on {} lost a race: {}", user_id, date, e);
                Ok(ShiftOutcome::Rejected(Rejection::ScheduleConflict))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete exactly one Pending shift. No rules apply.
    pub async fn remove_shift(
        &self,
        actor: &Actor,
        target: Option<UserId>,
        date: NaiveDate,
    ) -> Result<ShiftOutcome, AppError> {
        let user_id = actor.resolve_target(target)?;

        if self.repo.remove_shift(user_id, date).await? == 0 {
            return Ok(ShiftOutcome::Rejected(Rejection::NotFound));
        }

        tracing::info!("User {} unscheduled from {} by {}", user_id, date, actor.user_id);
        Ok(ShiftOutcome::Removed)
    }

    // ==================== BULK MONTH REPLACE ====================

    /// Replace a user's whole month with `dates`, all or nothing.
    pub async fn save_monthly_shifts(
        &self,
        actor: &Actor,
        target: Option<UserId>,
        year: i32,
        month: u32,
        dates: &[NaiveDate],
    ) -> Result<ShiftOutcome, AppError> {
        let user_id = actor.resolve_target(target)?;
        let policy = self.validator.policy();

        let requested = dates.len() as i64;
        if requested < policy.min_days_per_month || requested > policy.max_days_per_month {
            return Ok(ShiftOutcome::Rejected(Rejection::DayCountOutOfRange {
                min: policy.min_days_per_month,
                max: policy.max_days_per_month,
            }));
        }

        let open = open_scheduling_month(self.clock.today());
        if YearMonth::new(year, month) != Some(open) {
            return Ok(ShiftOutcome::Rejected(Rejection::MonthClosed { open }));
        }

        // One fetch attempt per request, however many dates are sent
        self.holidays.ensure_year_cached(open.year).await;
        let mut days = Vec::with_capacity(dates.len());
        for date in dates {
            let day = if open.contains(*date) {
                Some(self.holidays.cached_day_status(*date).await?)
            } else {
                None
            };
            days.push(day);
        }

        let mut uow = self.repo.begin().await?;
        let outcome = self
            .replace_month(uow.conn(), user_id, open, dates, &days)
            .await;
        let outcome = uow.finish(outcome).await?;

        match &outcome {
            ShiftOutcome::Rejected(rejection) => tracing::info!(
                "Monthly schedule for user {} ({}) rejected, nothing changed: {}",
                user_id,
                open,
                rejection
            ),
            _ => tracing::info!(
                "Monthly schedule for user {} ({}) saved with {} days",
                user_id,
                open,
                dates.len()
            ),
        }
        Ok(outcome)
    }

    async fn replace_month(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        month: YearMonth,
        dates: &[NaiveDate],
        days: &[Option<DayStatus>],
    ) -> Result<ShiftOutcome, AppError> {
        let max_per_day = self.validator.policy().max_staff_per_day;

        // Takes the write lock before any capacity is read
        let cleared = shifts::clear_user_month(&mut *conn, user_id, month).await?;
        tracing::debug!("Cleared {} shifts of user {} in {}", cleared, user_id, month);

        let now = Utc::now();
        let mut seen = HashSet::with_capacity(dates.len());

        for (&date, day) in dates.iter().zip(days) {
            let Some(day) = day else {
                return Ok(ShiftOutcome::Rejected(Rejection::OutsideBatchMonth {
                    date,
                    month,
                }));
            };
            if day.is_holiday {
                return Ok(ShiftOutcome::Rejected(Rejection::BatchHoliday { date }));
            }

            let occupancy = shifts::count_on_date(&mut *conn, date).await?;
            if occupancy >= max_per_day {
                return Ok(ShiftOutcome::Rejected(Rejection::BatchDayFull {
                    date,
                    max: max_per_day,
                }));
            }

            if !seen.insert(date) {
                return Ok(ShiftOutcome::Rejected(Rejection::DuplicateInBatch { date }));
            }
            shifts::insert_pending(&mut *conn, user_id, date, now).await?;
        }

        Ok(ShiftOutcome::MonthSaved)
    }

    // ==================== QUERIES ====================

    /// Dry-run the rules for a date without writing anything.
    pub async fn validate_shift(
        &self,
        actor: &Actor,
        target: Option<UserId>,
        date: NaiveDate,
    ) -> Result<ValidationReport, AppError> {
        let user_id = actor.resolve_target(target)?;
        let day = self.holidays.day_status(date).await?;
        let today = self.clock.today();

        let mut conn = self.repo.acquire().await?;
        let verdict = self
            .validator
            .validate(&mut conn, user_id, date, &day, today)
            .await?;

        Ok(ValidationReport {
            user_id,
            date,
            valid: verdict.is_ok(),
            reason: match verdict {
                Ok(()) => VALIDATION_PASSED.to_string(),
                Err(rejection) => rejection.to_string(),
            },
        })
    }

    /// A user's shifts and standing against the monthly bounds.
    pub async fn monthly_progress(
        &self,
        actor: &Actor,
        target: Option<UserId>,
        month: YearMonth,
    ) -> Result<MonthlyProgress, AppError> {
        let user_id = actor.resolve_target(target)?;
        let records = self.repo.user_month_shifts(user_id, month).await?;
        let policy = self.validator.policy();
        let current_shifts = records.len() as i64;

        Ok(MonthlyProgress {
            user_id,
            year: month.year,
            month: month.month,
            current_shifts,
            existing_dates: records.into_iter().map(|r| r.shift_date).collect(),
            min_required: policy.min_days_per_month,
            max_allowed: policy.max_days_per_month,
            is_compliant: policy.is_compliant(current_shifts),
        })
    }

    /// Pending occupancy of a date against the daily cap.
    pub async fn daily_occupancy(&self, date: NaiveDate) -> Result<DailyOccupancy, AppError> {
        Ok(DailyOccupancy {
            date,
            count: self.repo.daily_count(date).await?,
            capacity: self.validator.policy().max_staff_per_day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_messages() {
        assert_eq!(ShiftOutcome::Scheduled.message(), "排班成功");
        assert_eq!(ShiftOutcome::Removed.message(), "取消排班成功");
        assert_eq!(ShiftOutcome::MonthSaved.message(), "整月排班儲存成功");
        assert_eq!(
            ShiftOutcome::Rejected(Rejection::ScheduleConflict).message(),
            "該員工已在此日期排班"
        );
    }

    #[test]
    fn test_only_successes_commit() {
        assert!(ShiftOutcome::MonthSaved.should_commit());
        assert!(!ShiftOutcome::Rejected(Rejection::BatchHoliday {
            date: NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()
        })
        .should_commit());
    }

    #[test]
    fn test_rejection_becomes_error() {
        assert!(matches!(
            ShiftOutcome::Rejected(Rejection::NotFound).into_result(),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(ShiftOutcome::Removed.into_result().unwrap(), "取消排班成功");
    }
}
