use buddy_domain::{DomainError, ExpenseId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),
    #[error("Attachment too large: {size} bytes exceeds the {limit} byte limit")]
    AttachmentTooLarge { size: u64, limit: u64 },
    #[error("Unsupported attachment type: {0}")]
    UnsupportedContentType(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) => CoreError::Validation(message),
            other => CoreError::InvalidParameter(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export(err.to_string())
    }
}
