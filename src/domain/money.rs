//! Fixed-point currency amounts.
//!
//! Amounts are kept as integer minor units (two decimal places) so sums and
//! comparisons are exact. `Decimal` is used only at the API boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount must be non-negative")]
    Negative,

    #[error("Amount is too large")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Converts a user supplied decimal, rounding half away from zero to two
    /// decimal places.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            return Err(MoneyError::Negative);
        }

        let units = rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|v| v.to_i64())
            .ok_or(MoneyError::Overflow)?;

        Ok(Self(units))
    }

    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Two decimal places with comma thousands separators, e.g. `1,234.50`.
    #[must_use]
    pub fn grouped(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = (abs / 100).to_string();
        let cents = abs % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!("{sign}{grouped}.{cents:02}")
    }

    /// Grouped amount prefixed with a currency glyph, e.g. `₦1,234.50`.
    #[must_use]
    pub fn display_with(self, symbol: &str) -> String {
        format!("{symbol}{}", self.grouped())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.grouped())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| Self(acc.0.saturating_add(m.0)))
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::try_from_decimal(value).map_err(serde::de::Error::custom)
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
    fn test_grouped_formatting() {
        let m = Money::try_from_decimal(dec("1234.5")).unwrap();
        assert_eq!(m.grouped(), "1,234.50");
        assert_eq!(m.display_with("₦"), "₦1,234.50");

        assert_eq!(Money::ZERO.grouped(), "0.00");
        assert_eq!(Money::from_minor_units(9_999).grouped(), "99.99");
        assert_eq!(Money::from_minor_units(100_000_000).grouped(), "1,000,000.00");
        assert_eq!(Money::from_minor_units(12_345_678).grouped(), "123,456.78");
    }

    #[test]
    fn test_rounds_to_two_places() {
        assert_eq!(
            Money::try_from_decimal(dec("10.005")).unwrap(),
            Money::from_minor_units(1_001)
        );
        assert_eq!(
            Money::try_from_decimal(dec("10.004")).unwrap(),
            Money::from_minor_units(1_000)
        );
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Money::try_from_decimal(dec("-0.01")),
            Err(MoneyError::Negative)
        );
        assert_eq!(
            Money::try_from_decimal(dec("-0.001")).unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn test_sum_and_decimal() {
        let total: Money = [Money::from_minor_units(150), Money::from_minor_units(250)]
            .into_iter()
            .sum();
        assert_eq!(total.to_decimal(), dec("4.00"));
    }

    #[test]
    fn test_deserialize_accepts_numbers_and_strings() {
        let from_number: Money = serde_json::from_str("99.99").unwrap();
        let from_string: Money = serde_json::from_str("\"99.99\"").unwrap();
        assert_eq!(from_number, Money::from_minor_units(9_999));
        assert_eq!(from_string, from_number);
        assert!(serde_json::from_str::<Money>("-5").is_err());
    }

    #[test]
    fn test_serializes_as_two_decimal_string() {
        let json = serde_json::to_string(&Money::from_minor_units(123_450)).unwrap();
        assert_eq!(json, "\"1234.50\"");
    }
}
