// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown job state: {0}")]
    UnknownState(String),

    #[error("Malformed job record under {key}: {reason}")]
    MalformedRecord { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
