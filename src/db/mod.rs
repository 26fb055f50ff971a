//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for shift records, the holiday cache and
//! statistics snapshots.

mod holidays;
mod repository;
pub mod shifts;
mod statistics;
mod unit_of_work;

pub use repository::*;
pub use unit_of_work::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Maintained by the auth subsystem; read here for rosters and names.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shift_records (
            shift_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            shift_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS ux_shift_records_user_date_pending
            ON shift_records(user_id, shift_date) WHERE status = 'Pending';
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS holiday_cache (
            holiday_date TEXT PRIMARY KEY,
            holiday_name TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT,
            is_official_holiday INTEGER NOT NULL,
            cache_year INTEGER NOT NULL,
            last_updated_from_api TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shift_statistics (
            stat_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            stat_year INTEGER NOT NULL,
            stat_month INTEGER,
            total_shift_days INTEGER NOT NULL,
            last_calculated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS ux_shift_statistics_key
            ON shift_statistics(user_id, stat_year, IFNULL(stat_month, 0));
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_shift_records_date ON shift_records(shift_date, status);
        CREATE INDEX IF NOT EXISTS idx_holiday_cache_year ON holiday_cache(cache_year);
        CREATE INDEX IF NOT EXISTS idx_users_role_active ON users(role, is_active);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
