//! Domain errors for the deploy memory system.

use thiserror::Error;

/// Domain-level errors that can occur while collecting, classifying, or
/// remembering deployment failures.
///
/// A classification that matches no rule is *not* an error; it degrades to
/// `UNKNOWN`. Everything listed here is surfaced to the caller untouched.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Access denied while reading stack {stack}: {message}")]
    AccessDenied { stack: String, message: String },

    #[error("Upstream lookup failed: {0}")]
    UpstreamFailed(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether this error came from the upstream stack lookup rather than
    /// from local validation or persistence.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::StackNotFound(_) | Self::AccessDenied { .. } | Self::UpstreamFailed(_)
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
