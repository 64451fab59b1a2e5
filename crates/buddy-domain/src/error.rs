use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors raised while parsing or constructing domain values.
pub enum DomainError {
    InvalidRange,
    UnknownCategory(String),
    UnknownGranularity(String),
    UnknownWindow(String),
    UnknownSortOrder(String),
    Validation(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidRange => f.write_str("date range end must not precede its start"),
            DomainError::UnknownCategory(value) => write!(f, "unknown category `{value}`"),
            DomainError::UnknownGranularity(value) => write!(f, "unknown granularity `{value}`"),
            DomainError::UnknownWindow(value) => write!(f, "unknown window `{value}`"),
            DomainError::UnknownSortOrder(value) => write!(f, "unknown sort order `{value}`"),
            DomainError::Validation(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for DomainError {}
