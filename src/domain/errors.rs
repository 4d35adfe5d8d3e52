//! Domain errors for the progress engine.

use thiserror::Error;

/// Domain-level errors that can occur in the progress engine.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Kind string outside the four known kinds.
    #[error("Invalid task kind: {0} (expected one of: gratitude, journal, pomodoro, todo)")]
    InvalidTaskKind(String),

    /// Blank or oversized user id.
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),

    /// The store failed or timed out. Retryable.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A stored row could not be decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageError(_))
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTaskKind(_) => "INVALID_TASK_KIND",
            Self::InvalidUserId(_) => "INVALID_USER_ID",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::StorageError(err.to_string())
    }
}
