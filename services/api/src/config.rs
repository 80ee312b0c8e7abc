//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub classifier_model: String,
    pub cache_freshness: chrono::Duration,
    pub monitor_tick: Duration,
    pub batch_concurrency: usize,
    pub frontend_url: String,
    /// Statically provisioned `(token, owner)` pairs.
    pub auth_tokens: Vec<(String, Uuid)>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:5000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Classifier Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        let classifier_model = var_or("CLASSIFIER_MODEL", "gpt-4o-mini");

        // --- Pipeline Tuning ---
        let freshness_secs: i64 = parse_positive(
            &var_or("CACHE_FRESHNESS_SECS", "86400"),
            "CACHE_FRESHNESS_SECS",
        )?;
        let tick_ms: u64 =
            parse_positive(&var_or("MONITOR_TICK_MS", "3000"), "MONITOR_TICK_MS")?;
        let batch_concurrency: usize =
            parse_positive(&var_or("BATCH_CONCURRENCY", "4"), "BATCH_CONCURRENCY")?;

        let frontend_url = var_or("FRONTEND_URL", "http://localhost:3000");
        let auth_tokens = parse_auth_tokens(&var_or("AUTH_TOKENS", ""))?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            classifier_model,
            cache_freshness: chrono::Duration::seconds(freshness_secs),
            monitor_tick: Duration::from_millis(tick_ms),
            batch_concurrency,
            frontend_url,
            auth_tokens,
        })
    }
}

fn parse_positive<T>(raw: &str, key: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}

/// Parses `token=uuid,token=uuid`. Blank entries are skipped.
fn parse_auth_tokens(raw: &str) -> Result<Vec<(String, Uuid)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = |why: &str| {
                ConfigError::InvalidValue(
                    "AUTH_TOKENS".to_string(),
                    format!("'{}': {}", entry, why),
                )
            };
            let (token, owner) = entry
                .split_once('=')
                .ok_or_else(|| invalid("expected token=uuid"))?;
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid("empty token"));
            }
            let owner = Uuid::parse_str(owner.trim()).map_err(|e| invalid(&e.to_string()))?;
            Ok((token.to_string(), owner))
        })
        .collect()
}
