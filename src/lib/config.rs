use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::core::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub template_dir: PathBuf,
    /// Re-read the template directory before every render.
    pub template_reload: bool,
    pub db_timeout: Duration,
    pub db_max_connections: u32,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://todo_app.db?mode=rwc".to_string(),
            port: 8000,
            template_dir: PathBuf::from("templates"),
            template_reload: false,
            db_timeout: Duration::from_millis(5_000),
            db_max_connections: 5,
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parse_or("PORT", lookup("PORT"), defaults.port)?,
            template_dir: lookup("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            template_reload: parse_bool("TEMPLATE_RELOAD", lookup("TEMPLATE_RELOAD"))?
                .unwrap_or(defaults.template_reload),
            db_timeout: parse_millis("DB_TIMEOUT_MS", lookup("DB_TIMEOUT_MS"))?
                .unwrap_or(defaults.db_timeout),
            db_max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                lookup("DB_MAX_CONNECTIONS"),
                defaults.db_max_connections,
            )?,
            request_timeout: parse_millis("REQUEST_TIMEOUT_MS", lookup("REQUEST_TIMEOUT_MS"))?
                .unwrap_or(defaults.request_timeout),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has invalid value {raw:?}"))),
        None => Ok(default),
    }
}

fn parse_millis(key: &str, raw: Option<String>) -> Result<Option<Duration>, AppError> {
    raw.map(|raw| parse_or(key, Some(raw), 0u64).map(Duration::from_millis))
        .transpose()
}

fn parse_bool(key: &str, raw: Option<String>) -> Result<Option<bool>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(AppError::Config(format!("{key} has invalid value {raw:?}"))),
    }
}
