//! Shift record queries.
//!
//! Every function takes any SQLite executor, so the same statement runs
//! against the pool for standalone reads or against an open transaction
//! inside a unit of work.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::errors::AppError;
use crate::models::{ShiftRecord, ShiftStatus, UserId};
use crate::scheduling::YearMonth;

const PENDING: &str = "Pending";

/// Number of the user's Pending shifts within `month`.
pub async fn count_user_month<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: UserId,
    month: YearMonth,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM shift_records WHERE user_id = ? AND shift_date >= ? AND shift_date < ? AND status = ?",
    )
    .bind(user_id)
    .bind(month.first_day())
    .bind(month.first_day_of_next())
    .bind(PENDING)
    .fetch_one(executor)
    .await?;
    Ok(count)
}

/// Number of Pending shifts on `date` across all users.
pub async fn count_on_date<'e, E: SqliteExecutor<'e>>(
    executor: E,
    date: NaiveDate,
) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shift_records WHERE shift_date = ? AND status = ?")
            .bind(date)
            .bind(PENDING)
            .fetch_one(executor)
            .await?;
    Ok(count)
}

/// Whether the user holds a Pending shift on `date`.
pub async fn exists<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: UserId,
    date: NaiveDate,
) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT shift_id FROM shift_records WHERE user_id = ? AND shift_date = ? AND status = ? LIMIT 1",
    )
    .bind(user_id)
    .bind(date)
    .bind(PENDING)
    .fetch_optional(executor)
    .await?;
    Ok(found.is_some())
}

/// Insert a Pending shift stamped with `now`.
///
/// Returns the raw driver error so callers can tell a uniqueness collision
/// apart from other faults.
pub async fn insert_pending<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: UserId,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO shift_records (user_id, shift_date, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(date)
    .bind(ShiftStatus::Pending.as_str())
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Delete the user's Pending shift on `date`, returning rows removed.
pub async fn delete_pending<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: UserId,
    date: NaiveDate,
) -> Result<u64, AppError> {
    let result =
        sqlx::query("DELETE FROM shift_records WHERE user_id = ? AND shift_date = ? AND status = ?")
            .bind(user_id)
            .bind(date)
            .bind(PENDING)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}

/// Delete all of the user's Pending shifts within `month`.
pub async fn clear_user_month<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: UserId,
    month: YearMonth,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "DELETE FROM shift_records WHERE user_id = ? AND shift_date >= ? AND shift_date < ? AND status = ?",
    )
    .bind(user_id)
    .bind(month.first_day())
    .bind(month.first_day_of_next())
    .bind(PENDING)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// The user's Pending shifts within `month`, ordered by date.
pub async fn list_user_month<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: UserId,
    month: YearMonth,
) -> Result<Vec<ShiftRecord>, AppError> {
    let rows = sqlx::query(
        "SELECT shift_id, user_id, shift_date, status, created_at, updated_at FROM shift_records WHERE user_id = ? AND shift_date >= ? AND shift_date < ? AND status = ? ORDER BY shift_date",
    )
    .bind(user_id)
    .bind(month.first_day())
    .bind(month.first_day_of_next())
    .bind(PENDING)
    .fetch_all(executor)
    .await?;

    rows.iter()
        .map(shift_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// Whether a driver error is the Pending uniqueness index firing.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether a driver error means another writer got there first.
///
/// Covers SQLITE_BUSY and its extended codes, which SQLite returns when a
/// read snapshot can no longer be upgraded to a write.
pub fn is_write_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("5" | "261" | "517")),
        _ => false,
    }
}

fn shift_from_row(row: &SqliteRow) -> Result<ShiftRecord, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(ShiftRecord {
        shift_id: row.try_get("shift_id")?,
        user_id: row.try_get("user_id")?,
        shift_date: row.try_get("shift_date")?,
        status: ShiftStatus::from_str(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: format!("unknown shift status {status:?}").into(),
        })?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
