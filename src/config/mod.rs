//! Configuration module for the shift backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::scheduling::SchedulingPolicy;

/// Default location of the Taiwan government calendar mirror.
pub const DEFAULT_HOLIDAY_API_URL: &str =
    "https://allen0099.github.io/taiwan-calendar/{year}/all.json";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key the upstream auth gateway must present
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Holiday feed URL template; `{year}` is substituted per request
    pub holiday_api_url: String,
    /// Upper bound for a single holiday feed fetch
    pub holiday_timeout: Duration,
    /// Warm the holiday cache for the current (and, in December, next) year at startup
    pub prefetch_holidays: bool,
    /// Day-count and staffing limits
    pub policy: SchedulingPolicy,
    /// Malformed variables that fell back to defaults, logged once tracing is up
    pub ignored: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut ignored = Vec::new();

        let api_psk = env::var("SHIFT_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("SHIFT_DB_PATH")
            .unwrap_or_else(|_| "./data/shifts.sqlite".to_string())
            .into();

        let bind_addr = env::var("SHIFT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid SHIFT_BIND_ADDR format");

        let log_level = env::var("SHIFT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env_or(&mut ignored, "SHIFT_LOG_JSON", false);

        let holiday_api_url = env::var("SHIFT_HOLIDAY_API_URL")
            .unwrap_or_else(|_| DEFAULT_HOLIDAY_API_URL.to_string());
        let holiday_timeout =
            Duration::from_secs(env_or(&mut ignored, "SHIFT_HOLIDAY_TIMEOUT_SECS", 10));
        let prefetch_holidays = env_or(&mut ignored, "SHIFT_PREFETCH_HOLIDAYS", true);

        let defaults = SchedulingPolicy::default();
        let policy = SchedulingPolicy {
            min_days_per_month: env_or(
                &mut ignored,
                "SHIFT_MIN_DAYS",
                defaults.min_days_per_month,
            ),
            max_days_per_month: env_or(
                &mut ignored,
                "SHIFT_MAX_DAYS",
                defaults.max_days_per_month,
            ),
            max_staff_per_day: env_or(
                &mut ignored,
                "SHIFT_MAX_PER_DAY",
                defaults.max_staff_per_day,
            ),
        };

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            log_json,
            holiday_api_url,
            holiday_timeout,
            prefetch_holidays,
            policy,
            ignored,
        }
    }
}

/// Parse an optional variable, keeping the default when it is unset or malformed.
fn env_or<T: FromStr>(ignored: &mut Vec<String>, key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            ignored.push(format!("{}={:?}", key, raw));
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    /// Serializes tests that mutate process environment.
    pub(crate) static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const KEYS: &[&str] = &[
        "SHIFT_API_PSK",
        "SHIFT_DB_PATH",
        "SHIFT_BIND_ADDR",
        "SHIFT_LOG_LEVEL",
        "SHIFT_LOG_JSON",
        "SHIFT_HOLIDAY_API_URL",
        "SHIFT_HOLIDAY_TIMEOUT_SECS",
        "SHIFT_PREFETCH_HOLIDAYS",
        "SHIFT_MIN_DAYS",
        "SHIFT_MAX_DAYS",
        "SHIFT_MAX_PER_DAY",
    ];

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for key in KEYS {
            env::remove_var(key);
        }

        let config = Config::from_env();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/shifts.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.holiday_api_url, DEFAULT_HOLIDAY_API_URL);
        assert_eq!(config.holiday_timeout, Duration::from_secs(10));
        assert!(config.prefetch_holidays);
        assert_eq!(config.policy, SchedulingPolicy::default());
        assert!(config.ignored.is_empty());
    }

    #[test]
    fn test_policy_overrides_and_malformed_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for key in KEYS {
            env::remove_var(key);
        }
        env::set_var("SHIFT_MAX_PER_DAY", "3");
        env::set_var("SHIFT_MIN_DAYS", "four");
        env::set_var("SHIFT_API_PSK", "");

        let config = Config::from_env();

        assert_eq!(config.policy.max_staff_per_day, 3);
        assert_eq!(config.policy.min_days_per_month, 6);
        assert!(config.api_psk.is_none());
        assert_eq!(config.ignored, vec![r#"SHIFT_MIN_DAYS="four""#.to_string()]);

        env::remove_var("SHIFT_MAX_PER_DAY");
        env::remove_var("SHIFT_MIN_DAYS");
        env::remove_var("SHIFT_API_PSK");
    }
}
