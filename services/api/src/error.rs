//! services/api/src/error.rs
//!
//! Errors that can stop the service from starting or serving. Request-level
//! failures are mapped to HTTP responses in `web::rest` and never reach here.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pool connection or migration failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis was configured but could not be reached at startup.
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Binding the listener or serving failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
