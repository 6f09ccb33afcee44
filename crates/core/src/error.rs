// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// `Identity` and `Persistence` abort a submission. `Delivery` is reported by
/// emitters but never leaves the submission coordinator.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the client may retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Persistence(_) | AppError::Delivery(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Persistence(String)
