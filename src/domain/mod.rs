//! Domain module
//!
//! Value objects and business types shared across the crate. Everything in
//! here is validated at construction time and carries no infrastructure
//! dependencies.

mod amount;
mod error;
mod principal;

pub use amount::{Amount, AmountError};
pub use error::DomainError;
pub use principal::{Principal, Role};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a transaction record.
///
/// Serialized as lowercase strings; any other value fails deserialization,
/// which is what enforces the type-closure invariant at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Database/text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(DomainError::InvalidTransactionType(other.to_string())),
        }
    }
}

/// Type criterion for filtered listings. `Both` imposes no restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    Income,
    Expense,
    #[default]
    Both,
}

impl TypeFilter {
    /// The concrete type this filter restricts to, if any.
    pub fn restriction(&self) -> Option<TransactionType> {
        match self {
            Self::Income => Some(TransactionType::Income),
            Self::Expense => Some(TransactionType::Expense),
            Self::Both => None,
        }
    }
}
