use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::geo::distance_matrix::DEFAULT_BASE_URL;
use crate::store::postgres::PgSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store {other:?}, expected postgres or memory")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceProvider {
    Google,
    StraightLine,
}

impl FromStr for DistanceProvider {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "google" => Ok(DistanceProvider::Google),
            "straight_line" => Ok(DistanceProvider::StraightLine),
            other => Err(format!(
                "unknown distance provider {other:?}, expected google or straight_line"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub store: StoreBackend,
    pub database: Option<PgSettings>,
    pub distance_provider: DistanceProvider,
    pub maps_api_key: Option<String>,
    pub maps_base_url: String,
    pub maps_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let store = parse_or_default("ORDER_STORE", StoreBackend::Postgres)?;
        let database = match store {
            StoreBackend::Postgres => Some(PgSettings {
                url: required("DB_URI")?,
                max_connections: parse_or_default("DB_MAX_CONNECTIONS", 5)?,
                acquire_timeout: Duration::from_secs(parse_or_default(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    3,
                )?),
                statement_timeout: Duration::from_millis(parse_or_default(
                    "DB_STATEMENT_TIMEOUT_MS",
                    5000,
                )?),
                connect_attempts: parse_or_default("DB_CONNECT_ATTEMPTS", 10)?,
                retry_delay: Duration::from_secs(parse_or_default("DB_RETRY_DELAY_SECS", 5)?),
            }),
            StoreBackend::Memory => None,
        };

        let distance_provider = parse_or_default("DISTANCE_PROVIDER", DistanceProvider::Google)?;
        let maps_api_key = match distance_provider {
            DistanceProvider::Google => Some(required("MAPS_API_KEY")?),
            DistanceProvider::StraightLine => None,
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8080)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")),
            store,
            database,
            distance_provider,
            maps_api_key,
            maps_base_url: env::var("MAPS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            maps_timeout: Duration::from_secs(parse_or_default("MAPS_TIMEOUT_SECS", 5)?),
        })
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Internal(format!("{key} must be set")))
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
