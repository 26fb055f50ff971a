//! Shift API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{parse_date, parse_month, success, ApiResponse, ApiResult};
use crate::auth::Actor;
use crate::models::{
    BulkShiftRequest, DailyOccupancy, MonthCalendar, MonthlyProgress, SingleShiftRequest,
    UserSelector, ValidationReport,
};
use crate::AppState;

/// GET /api/shift/calendar/:year/:month - Holidays and weekends of a month.
pub async fn get_calendar(
    State(state): State<AppState>,
    _actor: Actor,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<MonthCalendar> {
    let month = parse_month(year, month)?;
    success(state.holidays.month_calendar(month).await?)
}

/// POST /api/shift/add - Schedule one date.
pub async fn add_shift(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<SingleShiftRequest>,
) -> ApiResult<()> {
    let date = parse_date(&request.shift_date)?;
    let message = state
        .shifts
        .add_shift(&actor, request.target_user_id, date)
        .await?
        .into_result()?;
    Ok(ApiResponse::with_message((), message))
}

/// DELETE /api/shift/remove - Cancel one scheduled date.
pub async fn remove_shift(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<SingleShiftRequest>,
) -> ApiResult<()> {
    let date = parse_date(&request.shift_date)?;
    let message = state
        .shifts
        .remove_shift(&actor, request.target_user_id, date)
        .await?
        .into_result()?;
    Ok(ApiResponse::with_message((), message))
}

/// POST /api/shift/bulk-save - Replace a whole month.
pub async fn bulk_save(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<BulkShiftRequest>,
) -> ApiResult<()> {
    let dates = request
        .shift_dates
        .iter()
        .map(|raw| parse_date(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let message = state
        .shifts
        .save_monthly_shifts(
            &actor,
            request.target_user_id,
            request.year,
            request.month,
            &dates,
        )
        .await?
        .into_result()?;
    Ok(ApiResponse::with_message((), message))
}

/// GET /api/shift/progress/:year/:month - Monthly count and scheduled dates.
pub async fn get_progress(
    State(state): State<AppState>,
    actor: Actor,
    Path((year, month)): Path<(i32, u32)>,
    Query(selector): Query<UserSelector>,
) -> ApiResult<MonthlyProgress> {
    let month = parse_month(year, month)?;
    success(
        state
            .shifts
            .monthly_progress(&actor, selector.user_id, month)
            .await?,
    )
}

/// GET /api/shift/daily-count/:date - Occupancy of one date.
pub async fn get_daily_count(
    State(state): State<AppState>,
    _actor: Actor,
    Path(date): Path<String>,
) -> ApiResult<DailyOccupancy> {
    let date = parse_date(&date)?;
    success(state.shifts.daily_occupancy(date).await?)
}

/// GET /api/shift/validate/:date - Dry-run the scheduling rules.
pub async fn validate_shift(
    State(state): State<AppState>,
    actor: Actor,
    Path(date): Path<String>,
    Query(selector): Query<UserSelector>,
) -> ApiResult<ValidationReport> {
    let date = parse_date(&date)?;
    success(
        state
            .shifts
            .validate_shift(&actor, selector.user_id, date)
            .await?,
    )
}
