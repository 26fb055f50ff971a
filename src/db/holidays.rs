//! Holiday cache persistence.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::models::{HolidayCacheEntry, HolidayCategory};
use crate::scheduling::YearMonth;

impl Repository {
    // ==================== HOLIDAY CACHE ====================

    /// Cached entry for a date, if the feed reported one.
    pub async fn holiday_entry(
        &self,
        date: NaiveDate,
    ) -> Result<Option<HolidayCacheEntry>, AppError> {
        let row = sqlx::query(
            "SELECT holiday_date, holiday_name, category, description, is_official_holiday, cache_year, last_updated_from_api FROM holiday_cache WHERE holiday_date = ?",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(holiday_from_row).transpose()?)
    }

    /// When the cached snapshot for `year` was taken; `None` if the year is not cached.
    pub async fn holiday_year_as_of(&self, year: i32) -> Result<Option<DateTime<Utc>>, AppError> {
        let as_of: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT last_updated_from_api FROM holiday_cache WHERE cache_year = ? ORDER BY last_updated_from_api DESC LIMIT 1",
        )
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(as_of)
    }

    /// Store a fetched year. Dates already cached are left untouched, so two
    /// concurrent populations of the same year converge on one row per date.
    pub async fn insert_holidays(&self, entries: &[HolidayCacheEntry]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for entry in entries {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO holiday_cache (holiday_date, holiday_name, category, description, is_official_holiday, cache_year, last_updated_from_api) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(entry.holiday_date)
            .bind(&entry.holiday_name)
            .bind(entry.category.as_str())
            .bind(&entry.description)
            .bind(entry.is_official_holiday as i32)
            .bind(entry.cache_year)
            .bind(entry.last_updated_from_api)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Official days off cached for a month, ordered by date.
    pub async fn cached_month_holidays(
        &self,
        month: YearMonth,
    ) -> Result<Vec<HolidayCacheEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT holiday_date, holiday_name, category, description, is_official_holiday, cache_year, last_updated_from_api FROM holiday_cache WHERE holiday_date >= ? AND holiday_date < ? AND is_official_holiday = 1 ORDER BY holiday_date",
        )
        .bind(month.first_day())
        .bind(month.first_day_of_next())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(holiday_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

fn holiday_from_row(row: &SqliteRow) -> Result<HolidayCacheEntry, sqlx::Error> {
    let category: String = row.try_get("category")?;
    let is_official: i32 = row.try_get("is_official_holiday")?;
    Ok(HolidayCacheEntry {
        holiday_date: row.try_get("holiday_date")?,
        holiday_name: row.try_get("holiday_name")?,
        category: HolidayCategory::from_str(&category).unwrap_or(HolidayCategory::National),
        description: row.try_get("description")?,
        is_official_holiday: is_official != 0,
        cache_year: row.try_get("cache_year")?,
        last_updated_from_api: row.try_get("last_updated_from_api")?,
    })
}
