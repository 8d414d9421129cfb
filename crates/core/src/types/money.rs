//! Decimal money amounts.
//!
//! The commerce API prices everything in a single store currency, so a
//! `Money` value is just an exact decimal amount. Arithmetic never goes
//! through floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency label shown next to every amount.
pub const CURRENCY_LABEL: &str = "EGP";

/// An exact amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole currency units, e.g. `Money::from_units(50)` for a flat fee.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Amount rounded to two decimals without the currency label, e.g. `"250.00"`.
    #[must_use]
    pub fn plain(&self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CURRENCY_LABEL} {}", self.plain())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

// Arithmetic clamps at the `Decimal` bounds.
impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_two_decimals() {
        assert_eq!(Money::from_units(250).to_string(), "EGP 250.00");
        assert_eq!(Money::new(Decimal::new(19_995, 3)).plain(), "20.00");
    }

    #[test]
    fn test_line_arithmetic() {
        let line = Money::from_units(100) * 2;
        let total: Money = [line, Money::from_units(50)].into_iter().sum();
        assert_eq!(total, Money::from_units(250));
        assert_eq!(total - line, Money::from_units(50));
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge * u32::MAX, huge);
        assert_eq!(huge + Money::from_units(1), huge);
        assert_eq!(Money::new(Decimal::MIN) - Money::from_units(1), Money::new(Decimal::MIN));
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let a: Money = serde_json::from_str("149.5").unwrap();
        let b: Money = serde_json::from_str("\"149.5\"").unwrap();
        assert_eq!(a, b);
    }
}
