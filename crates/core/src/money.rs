use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// A report value rounded to two decimal places. Always carries scale 2, so it
/// serializes as `"12.50"` rather than `"12.5"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_decimal(decimal: Decimal) -> Self {
        let mut rounded = round_cents(decimal);
        rounded.rescale(2);
        Money(rounded)
    }

    pub fn zero() -> Self {
        Money(Decimal::new(0, 2))
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn amount(self) -> Decimal {
        self.0
    }
}

/// Rounds half away from zero, so `0.005` becomes `0.01` rather than the
/// banker's `0.00`.
pub fn round_cents(decimal: Decimal) -> Decimal {
    decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(decimal: Decimal) -> Self {
        Money::from_decimal(decimal)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(Money::from_decimal(dec("10.456")).amount(), dec("10.46"));
        assert_eq!(Money::from_decimal(dec("0.005")).amount(), dec("0.01"));
    }

    #[test]
    fn display_pads_to_two_places() {
        assert_eq!(Money::from_decimal(dec("10")).to_string(), "10.00");
        assert_eq!(Money::from_decimal(dec("-3.5")).to_string(), "-3.50");
    }

    #[test]
    fn sum_of_nothing_is_zero() {
        let total: Money = Vec::<Money>::new().into_iter().sum();
        assert!(total.is_zero());
    }
}
