//! Client-side validation errors.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures detected before anything is sent to the backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A form value failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    /// An identifier was malformed or not positive.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The record is not in the cached list.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

/// Reject blank required form fields.
pub(crate) fn require_non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}
