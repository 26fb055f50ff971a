//! Shift Scheduling Backend
//!
//! REST backend for monthly shift scheduling with SQLite persistence and
//! holiday-aware validation.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod holidays;
mod models;
mod reporting;
mod scheduling;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use chrono::Datelike;
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use holidays::{HolidayOracle, HolidaySource, TaiwanCalendarSource};
use reporting::ReportingService;
use scheduling::{Clock, ShiftService, ShiftValidator, SystemClock};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub holidays: Arc<HolidayOracle>,
    pub shifts: Arc<ShiftService>,
    pub reports: Arc<ReportingService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the services over one pool.
    pub fn new(
        config: Config,
        pool: SqlitePool,
        source: Arc<dyn HolidaySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let repo = Repository::new(pool);
        let holidays = Arc::new(HolidayOracle::new(
            repo.clone(),
            source,
            config.holiday_timeout,
        ));
        let shifts = Arc::new(ShiftService::new(
            repo.clone(),
            holidays.clone(),
            ShiftValidator::new(config.policy),
            clock,
        ));
        let reports = Arc::new(ReportingService::new(repo, holidays.clone(), config.policy));

        Self {
            holidays,
            shifts,
            reports,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    for entry in &config.ignored {
        tracing::warn!("Ignoring malformed {}", entry);
    }

    tracing::info!("Starting Shift Scheduling Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Policy: {}-{} days per month, {} staff per day",
        config.policy.min_days_per_month,
        config.policy.max_days_per_month,
        config.policy.max_staff_per_day
    );

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SHIFT_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;

    let source = Arc::new(TaiwanCalendarSource::new(
        config.holiday_api_url.clone(),
        config.holiday_timeout,
    )?);
    let state = AppState::new(config.clone(), pool, source, Arc::new(SystemClock));

    // Warm the holiday cache; December also needs next year for the open month
    if config.prefetch_holidays {
        let today = SystemClock.today();
        state.holidays.ensure_year_cached(today.year()).await;
        if today.month() == 12 {
            state.holidays.ensure_year_cached(today.year() + 1).await;
        }
    }

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Shifts
        .route("/shift/calendar/{year}/{month}", get(api::get_calendar))
        .route("/shift/add", post(api::add_shift))
        .route("/shift/remove", delete(api::remove_shift))
        .route("/shift/bulk-save", post(api::bulk_save))
        .route("/shift/progress/{year}/{month}", get(api::get_progress))
        .route("/shift/daily-count/{date}", get(api::get_daily_count))
        .route("/shift/validate/{date}", get(api::validate_shift))
        // Statistics
        .route(
            "/statistics/monthly-schedule/{year}/{month}",
            get(api::get_monthly_schedule),
        )
        .route(
            "/statistics/leaderboard/{year}/{month}",
            get(api::get_leaderboard),
        )
        .route("/statistics/yearly-stats/{year}", get(api::get_yearly_stats))
        .route(
            "/statistics/recalculate/{year}/{month}",
            post(api::recalculate_statistics),
        )
        .route(
            "/statistics/employee/{user_id}/monthly/{year}/{month}",
            get(api::get_employee_monthly),
        )
        .route(
            "/statistics/employee/{user_id}/yearly/{year}",
            get(api::get_employee_yearly),
        )
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
