//! crates/flashmind_core/src/error.rs
//!
//! The error taxonomy surfaced by the resource service to its callers.

use crate::ports::PortError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No caller identity, or an invalid one.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The caller does not own the chat at the root of the resource chain.
    /// An absent chat is reported the same way.
    #[error("Forbidden")]
    Forbidden,

    /// The resource is absent under an otherwise authorized parent.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The generation collaborator failed or timed out.
    #[error("Flashcard generation failed: {0}")]
    UpstreamGeneration(String),

    /// The generation collaborator answered with content that is not a list of pairs.
    #[error("Flashcard generation returned malformed output: {0}")]
    UpstreamMalformed(String),

    /// Store or unexpected failure. The message is for logs only.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<PortError> for ServiceError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::NotFound(what) => ServiceError::NotFound(what),
            PortError::Conflict(what) => ServiceError::Conflict(what),
            PortError::Unauthorized => ServiceError::Unauthenticated,
            PortError::Malformed(msg) => ServiceError::UpstreamMalformed(msg),
            PortError::Unexpected(msg) => {
                error!("Store operation failed: {}", msg);
                ServiceError::Internal(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_faults_become_internal() {
        let e: ServiceError = PortError::Unexpected("connection reset".into()).into();
        assert!(matches!(e, ServiceError::Internal(_)));
    }

    #[test]
    fn missing_rows_stay_not_found() {
        let e: ServiceError = PortError::NotFound("Lecture x".into()).into();
        assert!(matches!(e, ServiceError::NotFound(ref w) if w == "Lecture x"));
    }
}
