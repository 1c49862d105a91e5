//! Ruble amounts using decimal arithmetic.
//!
//! The store sells in a single currency, so `Money` is a thin wrapper around
//! [`Decimal`] that adds the arithmetic the cart needs and ruble formatting.
//! Database columns are `NUMERIC(10,2)`.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of rubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero rubles.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole rubles.
    #[must_use]
    pub fn from_rubles(rubles: i64) -> Self {
        Self(Decimal::from(rubles))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: i32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Formats as the cart page shows prices: `1250 ₽`, `99.90 ₽`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        if rounded.fract().is_zero() {
            write!(f, "{} ₽", rounded.trunc())
        } else {
            write!(f, "{rounded:.2} ₽")
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let lines = [Money::from_rubles(250) * 2, Money::from_rubles(480).times(3)];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total, Money::from_rubles(1940));
    }

    #[test]
    fn test_display_whole_rubles() {
        assert_eq!(Money::from_rubles(1250).to_string(), "1250 ₽");
        assert_eq!(Money::new(Decimal::new(25000, 2)).to_string(), "250 ₽");
    }

    #[test]
    fn test_display_kopecks() {
        assert_eq!(Money::new(Decimal::new(9990, 2)).to_string(), "99.90 ₽");
    }

    #[test]
    fn test_ordering() {
        assert!(Money::from_rubles(3000) >= Money::from_rubles(3000));
        assert!(Money::from_rubles(2800) < Money::from_rubles(3000));
    }

    #[test]
    fn test_is_negative() {
        assert!(Money::from_rubles(-1).is_negative());
        assert!(!Money::ZERO.is_negative());
    }
}
