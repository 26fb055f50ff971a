//! Read-only reporting over Pending shifts, plus the statistics snapshot recompute.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::db::Repository;
use crate::errors::AppError;
use crate::holidays::{weekend_name, HolidayOracle};
use crate::models::{
    DaySchedule, Employee, EmployeeMonthlyCount, EmployeeYearlyCount, EmployeeYearlyStats,
    LeaderboardEntry, MonthlySchedule, ShiftStatistic, UserId,
};
use crate::scheduling::{SchedulingPolicy, YearMonth};

const MONTHS_PER_YEAR: u32 = 12;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How close a monthly count is to compliance, as a percentage.
///
/// Below the minimum the count is measured against the minimum; otherwise
/// against the maximum, capped at 100.
pub fn compliance_percentage(count: i64, policy: &SchedulingPolicy) -> f64 {
    if count < policy.min_days_per_month {
        round2(count as f64 / policy.min_days_per_month as f64 * 100.0)
    } else if count >= policy.max_days_per_month {
        100.0
    } else {
        round2(count as f64 / policy.max_days_per_month as f64 * 100.0)
    }
}

/// Rank employees by shift days, most first, ties broken by name.
pub fn rank_leaderboard(
    counts: Vec<(Employee, i64)>,
    policy: &SchedulingPolicy,
) -> Vec<LeaderboardEntry> {
    let mut counts = counts;
    counts.sort_by(|(a, a_days), (b, b_days)| match b_days.cmp(a_days) {
        Ordering::Equal => a.full_name.cmp(&b.full_name),
        other => other,
    });

    counts
        .into_iter()
        .enumerate()
        .map(|(index, (employee, shift_days))| LeaderboardEntry {
            rank: index + 1,
            user_id: employee.user_id,
            full_name: employee.full_name,
            shift_days,
            is_compliant: policy.is_compliant(shift_days),
            compliance_percentage: compliance_percentage(shift_days, policy),
        })
        .collect()
}

/// Aggregated views for managers.
pub struct ReportingService {
    repo: Repository,
    holidays: Arc<HolidayOracle>,
    policy: SchedulingPolicy,
}

impl ReportingService {
    pub fn new(repo: Repository, holidays: Arc<HolidayOracle>, policy: SchedulingPolicy) -> Self {
        Self {
            repo,
            holidays,
            policy,
        }
    }

    /// Every day of the month with its holiday status and who is scheduled.
    pub async fn monthly_schedule(&self, month: YearMonth) -> Result<MonthlySchedule, AppError> {
        let employees = self.repo.active_employees().await?;
        let roster = self.repo.month_shift_roster(month).await?;
        let holidays: HashMap<_, _> = self
            .holidays
            .month_holidays(month)
            .await?
            .into_iter()
            .map(|h| (h.date, h.name))
            .collect();

        let day_schedules = month
            .days()
            .map(|date| {
                let shifted_employees: Vec<_> = roster
                    .iter()
                    .filter(|s| s.shift_date == date)
                    .cloned()
                    .collect();
                let holiday_name = holidays.get(&date).cloned();

                DaySchedule {
                    date,
                    day_of_month: date.day(),
                    day_of_week: date.weekday().num_days_from_sunday(),
                    is_weekend: weekend_name(date).is_some(),
                    is_holiday: holiday_name.is_some(),
                    holiday_name: holiday_name.unwrap_or_default(),
                    current_shift_count: shifted_employees.len(),
                    shifted_employees,
                }
            })
            .collect();

        tracing::debug!(
            "Built schedule for {} ({} employees, {} shifts)",
            month,
            employees.len(),
            roster.len()
        );

        Ok(MonthlySchedule {
            year: month.year,
            month: month.month,
            employees,
            day_schedules,
            total_days: month.days_in_month(),
        })
    }

    /// Active employees ranked by shift days in `month`.
    pub async fn monthly_leaderboard(
        &self,
        month: YearMonth,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let counts = self.repo.employee_month_counts(month).await?;
        Ok(rank_leaderboard(counts, &self.policy))
    }

    /// Totals, month breakdown and compliance for every active employee over
    /// the year starting at `january`.
    pub async fn yearly_stats(
        &self,
        january: YearMonth,
    ) -> Result<Vec<EmployeeYearlyStats>, AppError> {
        let employees = self.repo.active_employees().await?;
        let mut by_user: HashMap<UserId, BTreeMap<u32, i64>> = HashMap::new();
        for row in self.repo.employee_year_breakdown(january).await? {
            by_user
                .entry(row.user_id)
                .or_default()
                .insert(row.month, row.shift_days);
        }

        let stats = employees
            .into_iter()
            .map(|employee| {
                let counted = by_user.remove(&employee.user_id).unwrap_or_default();
                let monthly_breakdown: BTreeMap<u32, i64> = (1..=MONTHS_PER_YEAR)
                    .map(|m| (m, counted.get(&m).copied().unwrap_or(0)))
                    .collect();

                let total: i64 = monthly_breakdown.values().sum();
                let compliant_months = monthly_breakdown
                    .values()
                    .filter(|count| self.policy.is_compliant(**count))
                    .count();

                EmployeeYearlyStats {
                    user_id: employee.user_id,
                    full_name: employee.full_name,
                    total_yearly_shifts: total,
                    average_monthly_shifts: round2(total as f64 / MONTHS_PER_YEAR as f64),
                    monthly_breakdown,
                    average_compliance_percentage: round2(
                        compliant_months as f64 / MONTHS_PER_YEAR as f64 * 100.0,
                    ),
                }
            })
            .collect();

        Ok(stats)
    }

    pub async fn employee_monthly(
        &self,
        user_id: UserId,
        month: YearMonth,
    ) -> Result<EmployeeMonthlyCount, AppError> {
        let shift_days = self.repo.employee_month_count(user_id, month).await?;
        Ok(EmployeeMonthlyCount {
            user_id,
            year: month.year,
            month: month.month,
            shift_days,
            is_compliant: self.policy.is_compliant(shift_days),
            min_required: self.policy.min_days_per_month,
            max_allowed: self.policy.max_days_per_month,
        })
    }

    pub async fn employee_yearly(
        &self,
        user_id: UserId,
        january: YearMonth,
    ) -> Result<EmployeeYearlyCount, AppError> {
        let total_shift_days = self.repo.employee_year_count(user_id, january).await?;
        Ok(EmployeeYearlyCount {
            user_id,
            year: january.year,
            total_shift_days,
            average_monthly_shifts: round2(total_shift_days as f64 / MONTHS_PER_YEAR as f64),
        })
    }

    /// Rewrite the month and year snapshots of every active employee.
    ///
    /// Returns the rows written.
    pub async fn recalculate_statistics(
        &self,
        month: YearMonth,
    ) -> Result<Vec<ShiftStatistic>, AppError> {
        let monthly = self.repo.employee_month_counts(month).await?;
        let mut yearly: HashMap<UserId, i64> = HashMap::new();
        for row in self.repo.employee_year_breakdown(month.start_of_year()).await? {
            *yearly.entry(row.user_id).or_default() += row.shift_days;
        }

        let now = Utc::now();
        let mut stats = Vec::with_capacity(monthly.len() * 2);
        for (employee, month_days) in &monthly {
            stats.push(ShiftStatistic {
                user_id: employee.user_id,
                stat_year: month.year,
                stat_month: Some(month.month),
                total_shift_days: *month_days,
                last_calculated_at: now,
            });
            stats.push(ShiftStatistic {
                user_id: employee.user_id,
                stat_year: month.year,
                stat_month: None,
                total_shift_days: yearly.get(&employee.user_id).copied().unwrap_or(0),
                last_calculated_at: now,
            });
        }

        self.repo.save_statistics(&stats).await?;
        tracing::info!(
            "Recalculated statistics for {} ({} employees)",
            month,
            monthly.len()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: UserId, name: &str) -> Employee {
        Employee {
            user_id: id,
            full_name: name.to_string(),
            username: name.to_lowercase(),
        }
    }

    #[test]
    fn test_compliance_percentage_bands() {
        let policy = SchedulingPolicy::default();
        assert_eq!(compliance_percentage(0, &policy), 0.0);
        assert_eq!(compliance_percentage(3, &policy), 50.0);
        assert_eq!(compliance_percentage(6, &policy), 40.0);
        assert_eq!(compliance_percentage(10, &policy), 66.67);
        assert_eq!(compliance_percentage(15, &policy), 100.0);
        assert_eq!(compliance_percentage(20, &policy), 100.0);
    }

    #[test]
    fn test_leaderboard_orders_by_days_then_name() {
        let policy = SchedulingPolicy::default();
        let board = rank_leaderboard(
            vec![
                (employee(2, "Bob"), 3),
                (employee(3, "Carol"), 10),
                (employee(1, "Alice"), 10),
                (employee(4, "Dan"), 0),
            ],
            &policy,
        );

        let names: Vec<_> = board.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(names, ["Alice", "Carol", "Bob", "Dan"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[3].rank, 4);

        assert!(board[0].is_compliant);
        assert_eq!(board[0].compliance_percentage, 66.67);
        assert!(!board[2].is_compliant);
        assert_eq!(board[2].compliance_percentage, 50.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.0 / 12.0), 0.83);
        assert_eq!(round2(2.0 / 3.0 * 100.0), 66.67);
    }
}
