//! Configuration module for the institute backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Internal(format!(
                "Invalid INSTITUTE_LOG_FORMAT: {}",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for admin routes (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file backing the document store
    pub db_path: PathBuf,
    /// Path to Tantivy catalog index directory
    pub index_path: PathBuf,
    /// Directory for uploaded files
    pub uploads_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Admin account created or refreshed at start-up
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Lifetime of a sign-in session
    pub session_ttl_hours: i64,
    /// Maximum number of cached list responses
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_psk: env::var("INSTITUTE_API_PSK").ok(),
            db_path: var_or("INSTITUTE_DB_PATH", "./data/institute.sqlite").into(),
            index_path: var_or("INSTITUTE_INDEX_PATH", "./data/index").into(),
            uploads_path: var_or("INSTITUTE_UPLOADS_PATH", "./data/uploads").into(),
            bind_addr: parse_var("INSTITUTE_BIND_ADDR", "127.0.0.1:8080")?,
            log_level: var_or("INSTITUTE_LOG_LEVEL", "info"),
            log_format: var_or("INSTITUTE_LOG_FORMAT", "pretty").parse()?,
            admin_email: env::var("INSTITUTE_ADMIN_EMAIL").ok(),
            admin_password: env::var("INSTITUTE_ADMIN_PASSWORD").ok(),
            session_ttl_hours: session_ttl_hours(parse_var(
                "INSTITUTE_SESSION_TTL_HOURS",
                "168",
            )?)?,
            cache_capacity: parse_var("INSTITUTE_CACHE_CAPACITY", "256")?,
            cache_ttl_secs: parse_var("INSTITUTE_CACHE_TTL_SECS", "300")?,
            max_upload_bytes: parse_var("INSTITUTE_MAX_UPLOAD_BYTES", "10485760")?,
        })
    }

    /// Configuration rooted in a scratch directory, used by tests.
    #[cfg(test)]
    pub fn for_dir(dir: &std::path::Path) -> Self {
        Self {
            api_psk: None,
            db_path: dir.join("test.sqlite"),
            index_path: dir.join("index"),
            uploads_path: dir.join("uploads"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
            admin_email: None,
            admin_password: None,
            session_ttl_hours: 1,
            cache_capacity: 64,
            cache_ttl_secs: 60,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

/// Longest accepted session lifetime: ten years.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

fn session_ttl_hours(hours: i64) -> Result<i64, AppError> {
    if (1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(AppError::Internal(format!(
            "Invalid INSTITUTE_SESSION_TTL_HOURS ({}): must be between 1 and {}",
            hours, MAX_SESSION_TTL_HOURS
        )))
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &var_or(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Internal(format!("Invalid {} ({}): {}", key, raw, e)))
}
