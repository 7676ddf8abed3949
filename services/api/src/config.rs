//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// PostgreSQL URL. Without one the service runs on the in-memory store.
    pub database_url: Option<String>,
    /// Redis URL. Without one the service uses an in-process cache.
    pub redis_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub flashcard_model: String,
    pub cache_ttl: Duration,
    pub generation_timeout: Duration,
    pub session_ttl_days: i64,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server, Database and Cache Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3001".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let redis_url = lookup("REDIS_URL").filter(|v| !v.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generation Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty());
        let flashcard_model =
            lookup("FLASHCARD_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        // --- Timing ---
        let cache_ttl = Duration::from_secs(parse_number(&lookup, "CACHE_TTL_SECS", 60)?);
        let generation_timeout =
            Duration::from_secs(parse_number(&lookup, "GENERATION_TIMEOUT_SECS", 30)?);
        let session_ttl_days = parse_number(&lookup, "SESSION_TTL_DAYS", 30)? as i64;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            redis_url,
            log_level,
            openai_api_key,
            flashcard_model,
            cache_ttl,
            generation_timeout,
            session_ttl_days,
            cors_origin,
        })
    }
}

fn parse_number<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::InvalidValue(
                name.to_string(),
                "must be greater than zero".to_string(),
            )),
            Ok(value) => Ok(value),
            Err(e) => Err(ConfigError::InvalidValue(name.to_string(), e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3001);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.flashcard_model, "gpt-4o-mini");
        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/flashmind"),
            ("REDIS_URL", "redis://127.0.0.1:6379"),
            ("CACHE_TTL_SECS", "5"),
            ("RUST_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.log_level, Level::DEBUG);
        assert!(config.database_url.is_some());
        assert!(config.redis_url.is_some());
    }

    #[test]
    fn invalid_numbers_are_reported_by_name() {
        let err = load(&[("CACHE_TTL_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "CACHE_TTL_SECS"));

        let err = load(&[("GENERATION_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "GENERATION_TIMEOUT_SECS"));
    }

    #[test]
    fn invalid_bind_address_is_rejected() {
        assert!(matches!(
            load(&[("BIND_ADDRESS", "not-an-address")]),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }
}
