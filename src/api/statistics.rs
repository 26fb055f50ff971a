//! Statistics API endpoints. Managers only.

use axum::extract::{Path, State};

use super::{parse_month, parse_year, success, ApiResponse, ApiResult};
use crate::auth::Actor;
use crate::models::{
    EmployeeMonthlyCount, EmployeeYearlyCount, EmployeeYearlyStats, LeaderboardEntry,
    MonthlySchedule, ShiftStatistic, UserId,
};
use crate::AppState;

/// GET /api/statistics/monthly-schedule/:year/:month
pub async fn get_monthly_schedule(
    State(state): State<AppState>,
    actor: Actor,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<MonthlySchedule> {
    actor.require_manager()?;
    let month = parse_month(year, month)?;
    success(state.reports.monthly_schedule(month).await?)
}

/// GET /api/statistics/leaderboard/:year/:month
pub async fn get_leaderboard(
    State(state): State<AppState>,
    actor: Actor,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    actor.require_manager()?;
    let month = parse_month(year, month)?;
    success(state.reports.monthly_leaderboard(month).await?)
}

/// GET /api/statistics/yearly-stats/:year
pub async fn get_yearly_stats(
    State(state): State<AppState>,
    actor: Actor,
    Path(year): Path<i32>,
) -> ApiResult<Vec<EmployeeYearlyStats>> {
    actor.require_manager()?;
    let january = parse_year(year)?;
    success(state.reports.yearly_stats(january).await?)
}

/// POST /api/statistics/recalculate/:year/:month
pub async fn recalculate_statistics(
    State(state): State<AppState>,
    actor: Actor,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Vec<ShiftStatistic>> {
    actor.require_manager()?;
    let month = parse_month(year, month)?;
    let written = state.reports.recalculate_statistics(month).await?;
    Ok(ApiResponse::with_message(written, "統計重新計算完成"))
}

/// GET /api/statistics/employee/:user_id/monthly/:year/:month
pub async fn get_employee_monthly(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, year, month)): Path<(UserId, i32, u32)>,
) -> ApiResult<EmployeeMonthlyCount> {
    actor.require_manager()?;
    let month = parse_month(year, month)?;
    success(state.reports.employee_monthly(user_id, month).await?)
}

/// GET /api/statistics/employee/:user_id/yearly/:year
pub async fn get_employee_yearly(
    State(state): State<AppState>,
    actor: Actor,
    Path((user_id, year)): Path<(UserId, i32)>,
) -> ApiResult<EmployeeYearlyCount> {
    actor.require_manager()?;
    let january = parse_year(year)?;
    success(state.reports.employee_yearly(user_id, january).await?)
}
