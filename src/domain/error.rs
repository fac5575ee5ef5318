//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations and domain invariant
/// failures. They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid amount (below minimum, too precise, or exceeds limit)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Transaction type outside the accepted set
    #[error("Invalid transaction type: {0} (expected 'income' or 'expense')")]
    InvalidTransactionType(String),

    /// Required field missing or empty after trimming
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Transaction date lies in the future
    #[error("Future transaction dates are not allowed")]
    FutureTransactionDate,

    /// Date string could not be parsed
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Business rule violation not covered by a specific variant
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),
}

impl DomainError {
    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        // Every domain error here originates from caller input
        true
    }
}

impl From<crate::domain::AmountError> for DomainError {
    fn from(err: crate::domain::AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}
