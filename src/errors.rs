use serde::Serialize;

/// Unified error type returned by the booking engine's services.
///
/// The taxonomy follows how callers are expected to react:
/// input errors go back to the user for correction, `NotFound` should
/// prompt a refresh, `Conflict` is retryable, and external failures are
/// reported as such without leaking transport details.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    /// Whether the caller may reasonably retry the failed operation.
    ///
    /// Conflicts are retryable by the *caller* only; the engine never
    /// retries writes on its own, since replaying a full-table replace
    /// could compound data loss.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Conflict(_) | ServiceError::ExternalServiceError(_)
        )
    }

    /// Whether this is a user-correctable input problem rather than a
    /// system fault. Input problems are surfaced, never logged as errors.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidInput(_) | ServiceError::ValidationError(_)
        )
    }
}
