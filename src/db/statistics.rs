//! Reporting queries and statistics snapshots.

use sqlx::Row;

use super::{shifts, Repository};
use crate::errors::AppError;
use crate::models::{Employee, Role, ShiftStatistic, ShiftedEmployee, UserId};
use crate::scheduling::YearMonth;

/// Month (1-12) and count of one employee's shifts within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    pub user_id: UserId,
    pub month: u32,
    pub shift_days: i64,
}

impl Repository {
    // ==================== ROSTER ====================

    /// Active employees ordered by full name.
    pub async fn active_employees(&self) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query(
            "SELECT user_id, full_name, username FROM users WHERE role = ? AND is_active = 1 ORDER BY full_name, user_id",
        )
        .bind(Role::Employee.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut employees = Vec::with_capacity(rows.len());
        for row in rows {
            employees.push(Employee {
                user_id: row.try_get("user_id")?,
                full_name: row.try_get("full_name")?,
                username: row.try_get("username")?,
            });
        }
        Ok(employees)
    }

    // ==================== MONTHLY VIEWS ====================

    /// Every Pending shift of the month with the holder's name.
    pub async fn month_shift_roster(
        &self,
        month: YearMonth,
    ) -> Result<Vec<ShiftedEmployee>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT s.user_id, u.full_name, s.shift_date
            FROM shift_records s
            JOIN users u ON u.user_id = s.user_id
            WHERE s.shift_date >= ? AND s.shift_date < ? AND s.status = 'Pending'
            ORDER BY s.shift_date, u.full_name
            "#,
        )
        .bind(month.first_day())
        .bind(month.first_day_of_next())
        .fetch_all(&self.pool)
        .await?;

        let mut roster = Vec::with_capacity(rows.len());
        for row in rows {
            roster.push(ShiftedEmployee {
                user_id: row.try_get("user_id")?,
                full_name: row.try_get("full_name")?,
                shift_date: row.try_get("shift_date")?,
            });
        }
        Ok(roster)
    }

    /// Pending count of every active employee in `month`, zero included.
    pub async fn employee_month_counts(
        &self,
        month: YearMonth,
    ) -> Result<Vec<(Employee, i64)>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT u.user_id, u.full_name, u.username, COUNT(s.shift_id) AS shift_days
            FROM users u
            LEFT JOIN shift_records s
                ON s.user_id = u.user_id
                AND s.status = 'Pending'
                AND s.shift_date >= ? AND s.shift_date < ?
            WHERE u.role = ? AND u.is_active = 1
            GROUP BY u.user_id, u.full_name, u.username
            "#,
        )
        .bind(month.first_day())
        .bind(month.first_day_of_next())
        .bind(Role::Employee.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let employee = Employee {
                user_id: row.try_get("user_id")?,
                full_name: row.try_get("full_name")?,
                username: row.try_get("username")?,
            };
            counts.push((employee, row.try_get("shift_days")?));
        }
        Ok(counts)
    }

    // ==================== YEARLY VIEWS ====================

    /// Per-user, per-month Pending counts in the year starting at `january`;
    /// months without shifts are absent.
    pub async fn employee_year_breakdown(
        &self,
        january: YearMonth,
    ) -> Result<Vec<MonthCount>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, CAST(strftime('%m', shift_date) AS INTEGER) AS month, COUNT(*) AS shift_days
            FROM shift_records
            WHERE shift_date >= ? AND shift_date < ? AND status = 'Pending'
            GROUP BY user_id, month
            "#,
        )
        .bind(january.first_day())
        .bind(january.next_year().first_day())
        .fetch_all(&self.pool)
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let month: i64 = row.try_get("month")?;
            counts.push(MonthCount {
                user_id: row.try_get("user_id")?,
                month: month as u32,
                shift_days: row.try_get("shift_days")?,
            });
        }
        Ok(counts)
    }

    /// One user's Pending count in `month`.
    pub async fn employee_month_count(
        &self,
        user_id: UserId,
        month: YearMonth,
    ) -> Result<i64, AppError> {
        shifts::count_user_month(&self.pool, user_id, month).await
    }

    /// One user's Pending count in the year starting at `january`.
    pub async fn employee_year_count(
        &self,
        user_id: UserId,
        january: YearMonth,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shift_records WHERE user_id = ? AND shift_date >= ? AND shift_date < ? AND status = 'Pending'",
        )
        .bind(user_id)
        .bind(january.first_day())
        .bind(january.next_year().first_day())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // ==================== SNAPSHOTS ====================

    /// Upsert statistics snapshots in one transaction.
    pub async fn save_statistics(&self, stats: &[ShiftStatistic]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for stat in stats {
            let updated = sqlx::query(
                "UPDATE shift_statistics SET total_shift_days = ?, last_calculated_at = ? WHERE user_id = ? AND stat_year = ? AND stat_month IS ?",
            )
            .bind(stat.total_shift_days)
            .bind(stat.last_calculated_at)
            .bind(stat.user_id)
            .bind(stat.stat_year)
            .bind(stat.stat_month.map(i64::from))
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                sqlx::query(
                    "INSERT INTO shift_statistics (user_id, stat_year, stat_month, total_shift_days, last_calculated_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(stat.user_id)
                .bind(stat.stat_year)
                .bind(stat.stat_month.map(i64::from))
                .bind(stat.total_shift_days)
                .bind(stat.last_calculated_at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
