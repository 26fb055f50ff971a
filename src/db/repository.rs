//! Database repository for shift, holiday and statistics data.
//!
//! Standalone reads go straight to the pool; multi-statement writes open a
//! [`UnitOfWork`] and run the [`shifts`] queries on its connection.

use chrono::NaiveDate;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};

use super::{shifts, UnitOfWork};
use crate::errors::AppError;
use crate::models::{ShiftRecord, UserId};
use crate::scheduling::YearMonth;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a transaction for a multi-statement write.
    pub async fn begin(&self) -> Result<UnitOfWork, AppError> {
        UnitOfWork::begin(&self.pool).await
    }

    /// Check out a connection for a read that spans several statements.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, AppError> {
        Ok(self.pool.acquire().await?)
    }

    // ==================== SHIFT OPERATIONS ====================

    /// Pending occupancy of a date.
    pub async fn daily_count(&self, date: NaiveDate) -> Result<i64, AppError> {
        shifts::count_on_date(&self.pool, date).await
    }

    /// Delete a user's Pending shift on `date`, returning rows removed.
    pub async fn remove_shift(&self, user_id: UserId, date: NaiveDate) -> Result<u64, AppError> {
        shifts::delete_pending(&self.pool, user_id, date).await
    }

    /// A user's Pending shifts in a month, ordered by date.
    pub async fn user_month_shifts(
        &self,
        user_id: UserId,
        month: YearMonth,
    ) -> Result<Vec<ShiftRecord>, AppError> {
        shifts::list_user_month(&self.pool, user_id, month).await
    }
}
