//! Money and currency primitives.
//!
//! CRITICAL: All money values inside the core are i64 minor units
//! (cents for USD/EUR/GBP, paise for INR). Decimal (major-unit)
//! amounts exist only at the HTTP and catalog-configuration
//! boundaries and are converted on entry with `round(amount * 100)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported settlement currencies (ISO 4217).
///
/// The registration system prices every catalog entry in all four
/// currencies; a currency outside this set is rejected at the parse
/// boundary, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    INR,
}

impl Currency {
    /// All currencies the pricing catalog must cover.
    pub const ALL: [Currency; 4] = [Currency::USD, Currency::EUR, Currency::GBP, Currency::INR];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::INR => "INR",
        }
    }

    /// Minor units per major unit (cents per dollar, paise per rupee).
    pub const fn minor_per_major() -> i64 {
        100
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors constructing or combining money values
#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),

    #[error("amount is not a finite number")]
    NotFinite,

    #[error("amount {0} out of representable range")]
    OutOfRange(f64),

    #[error("amount must be positive")]
    NotPositive,

    #[error("money arithmetic overflow")]
    Overflow,
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "INR" => Ok(Currency::INR),
            other => Err(MoneyError::UnsupportedCurrency(other.to_string())),
        }
    }
}

/// A monetary amount in i64 minor units.
///
/// Serializes transparently as the minor-unit integer, so persisted
/// records never carry floating point money.
///
/// # Example
/// ```
/// use registration_core::Money;
///
/// let fee = Money::from_major(399.5).unwrap();
/// assert_eq!(fee.minor_units(), 39950);
/// assert_eq!(fee.to_string(), "399.50");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money { minor: 0 };

    /// Construct from minor units (cents/paise).
    pub const fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Construct from a major-unit decimal amount using
    /// `round(amount * 100)`.
    ///
    /// Rejects non-finite input and amounts outside the i64 range.
    pub fn from_major(amount: f64) -> Result<Self, MoneyError> {
        if !amount.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        let scaled = (amount * Currency::minor_per_major() as f64).round();
        if scaled < i64::MIN as f64 || scaled > i64::MAX as f64 {
            return Err(MoneyError::OutOfRange(amount));
        }
        Ok(Self {
            minor: scaled as i64,
        })
    }

    /// Get the amount in minor units.
    pub const fn minor_units(&self) -> i64 {
        self.minor
    }

    /// Get the amount in major units (display/boundary use only).
    pub fn to_major(&self) -> f64 {
        self.minor as f64 / Currency::minor_per_major() as f64
    }

    /// Whether the amount is strictly positive.
    pub const fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Money) -> Result<Money, MoneyError> {
        self.minor
            .checked_add(other.minor)
            .map(Money::from_minor)
            .ok_or(MoneyError::Overflow)
    }

    /// Checked multiplication by a non-negative count.
    pub fn checked_mul(&self, count: u32) -> Result<Money, MoneyError> {
        self.minor
            .checked_mul(i64::from(count))
            .map(Money::from_minor)
            .ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for Money {
    /// Formats as a major-unit decimal with two places, e.g. `399.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_rounds_half_up() {
        assert_eq!(Money::from_major(399.5).unwrap().minor_units(), 39950);
        assert_eq!(Money::from_major(299.0).unwrap().minor_units(), 29900);
        assert_eq!(Money::from_major(0.005).unwrap().minor_units(), 1);
    }

    #[test]
    fn test_from_major_rejects_non_finite() {
        assert_eq!(Money::from_major(f64::NAN), Err(MoneyError::NotFinite));
        assert_eq!(Money::from_major(f64::INFINITY), Err(MoneyError::NotFinite));
    }

    #[test]
    fn test_from_major_rejects_out_of_range() {
        assert_eq!(
            Money::from_major(1.0e18),
            Err(MoneyError::OutOfRange(1.0e18))
        );
    }

    #[test]
    fn test_display_major_units() {
        assert_eq!(Money::from_minor(39950).to_string(), "399.50");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(-125).to_string(), "-1.25");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!("INR".parse::<Currency>().unwrap(), Currency::INR);
        assert!(matches!(
            "AUD".parse::<Currency>(),
            Err(MoneyError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_checked_mul_overflow() {
        let big = Money::from_minor(i64::MAX);
        assert_eq!(big.checked_mul(2), Err(MoneyError::Overflow));
    }
}
