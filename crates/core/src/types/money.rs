//! Money amounts in the smallest currency unit.

use core::fmt;
use core::ops::{Add, AddAssign};

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// An amount of money in cents.
///
/// Catalog prices and cart totals are integers in the smallest unit; vendor
/// quotes arrive as decimal dollar strings and are converted on the way in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a number of cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// The raw number of cents.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Multiply a unit price by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Convert a decimal dollar string (e.g. `"7.45"`) to cents, rounding
    /// half away from zero. Returns `None` if the string is not a number.
    #[must_use]
    pub fn from_dollars_str(value: &str) -> Option<Self> {
        let dollars: Decimal = value.trim().parse().ok()?;
        let cents = (dollars * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        cents.to_i64().map(Self)
    }

    /// The amount in dollars, two decimal places.
    #[must_use]
    pub fn to_dollars(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl From<i64> for Cents {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

/// Formats as dollars, e.g. `$25.00`.
impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.to_dollars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_add() {
        let total = Cents::new(1000).times(1) + Cents::new(500).times(3);
        assert_eq!(total, Cents::new(2500));
    }

    #[test]
    fn test_from_dollars_str() {
        assert_eq!(Cents::from_dollars_str("7.45"), Some(Cents::new(745)));
        assert_eq!(Cents::from_dollars_str(" 12 "), Some(Cents::new(1200)));
        assert_eq!(Cents::from_dollars_str("0.005"), Some(Cents::new(1)));
        assert_eq!(Cents::from_dollars_str("free"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Cents::new(2500).to_string(), "$25.00");
        assert_eq!(Cents::new(7).to_string(), "$0.07");
    }
}
