//! Field validation shared by all write models.

use thiserror::Error;

/// Errors raised when a write model is missing data the ledger requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    #[error("invalid order status: {0}")]
    UnknownStatus(String),

    #[error("order status cannot change from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Fail with `MissingField` when `value` is empty or whitespace.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}
