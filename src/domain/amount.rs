//! Amount type
//!
//! Domain primitive for monetary amounts with business rule validation.
//! All amounts are validated at construction time, ensuring invalid values
//! cannot exist in the system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// Smallest accepted amount (one cent)
const MIN_AMOUNT: &str = "0.01";

/// Maximum allowed amount (1 billion)
const MAX_AMOUNT: &str = "1000000000";

/// Maximum decimal places (2)
const MAX_SCALE: u32 = 2;

/// Amount represents a validated monetary value.
///
/// # Invariants
/// - Value is at least 0.01 (strictly positive, one-cent minimum unit)
/// - Maximum 2 decimal places
/// - Maximum value is 1 billion
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use fintrack::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(4250, 2)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(4250, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be at least {MIN_AMOUNT} (got {0})")]
    BelowMinimum(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::BelowMinimum` if value < 0.01
    /// - `AmountError::TooManyDecimals` if more than 2 decimal places
    /// - `AmountError::Overflow` if value > 1 billion
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        let min = Decimal::from_str(MIN_AMOUNT).expect("Invalid MIN_AMOUNT constant");
        if value < min {
            return Err(AmountError::BelowMinimum(value));
        }

        if value.normalize().scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(value.normalize().scale()));
        }

        let max = Decimal::from_str(MAX_AMOUNT).expect("Invalid MAX_AMOUNT constant");
        if value > max {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Create an Amount from an integer (no decimal places).
    pub fn from_integer(value: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::from(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Add another amount, re-validating the sum.
    pub fn try_add(&self, other: &Amount) -> Result<Amount, AmountError> {
        Amount::new(self.0 + other.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Result<Amount, AmountError>;

    fn add(self, rhs: Self) -> Self::Output {
        self.try_add(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_amount() {
        let amount = Amount::new(dec!(42.50)).unwrap();
        assert_eq!(amount.value(), dec!(42.50));
    }

    #[test]
    fn test_minimum_unit_accepted() {
        assert!(Amount::new(dec!(0.01)).is_ok());
    }

    #[test]
    fn test_zero_rejected() {
        assert_eq!(Amount::new(dec!(0)), Err(AmountError::BelowMinimum(dec!(0))));
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Amount::new(dec!(-5.00)),
            Err(AmountError::BelowMinimum(_))
        ));
    }

    #[test]
    fn test_too_many_decimals_rejected() {
        assert_eq!(
            Amount::new(dec!(1.005)),
            Err(AmountError::TooManyDecimals(3))
        );
    }

    #[test]
    fn test_trailing_zeros_normalized() {
        // 1.100 has scale 3 but normalizes to scale 1
        assert!(Amount::new(dec!(1.100)).is_ok());
    }

    #[test]
    fn test_overflow_rejected() {
        assert_eq!(Amount::new(dec!(1000000001)), Err(AmountError::Overflow));
    }

    #[test]
    fn test_parse_from_string() {
        let amount: Amount = "100.50".parse().unwrap();
        assert_eq!(amount.value(), dec!(100.50));

        assert!(matches!(
            "abc".parse::<Amount>(),
            Err(AmountError::ParseError(_))
        ));
    }

    #[test]
    fn test_try_add() {
        let a = Amount::new(dec!(10.25)).unwrap();
        let b = Amount::new(dec!(4.75)).unwrap();
        assert_eq!(a.try_add(&b).unwrap().value(), dec!(15.00));
    }
}
