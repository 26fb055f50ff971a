//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod shifts;
mod statistics;

pub use shifts::*;
pub use statistics::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::errors::AppError;
use crate::scheduling::{YearMonth, SUPPORTED_YEARS};

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Parse a `YYYY-MM-DD` path or body date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .filter(|date| SUPPORTED_YEARS.contains(&date.year()))
        .ok_or_else(|| AppError::BadRequest("日期格式錯誤".to_string()))
}

/// Validate a year/month pair from the path.
pub fn parse_month(year: i32, month: u32) -> Result<YearMonth, AppError> {
    YearMonth::new(year, month).ok_or_else(|| AppError::BadRequest("月份格式錯誤".to_string()))
}

/// Validate a year from the path, as the January that starts it.
pub fn parse_year(year: i32) -> Result<YearMonth, AppError> {
    YearMonth::january(year).ok_or_else(|| AppError::BadRequest("年份格式錯誤".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-02-09").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 9).unwrap()
        );
        assert!(matches!(
            parse_date("2026/02/09"),
            Err(AppError::BadRequest(_))
        ));
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("0000-01-01").is_err());
        assert!(parse_date("+10000-01-01").is_err());
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(2026).unwrap(), YearMonth::new(2026, 1).unwrap());
        assert!(matches!(parse_year(0), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_year(i32::MAX), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_month() {
        assert!(parse_month(2026, 12).is_ok());
        assert!(matches!(parse_month(2026, 13), Err(AppError::BadRequest(_))));
    }
}
