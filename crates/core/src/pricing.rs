//! Shipping and cart totals.
//!
//! The same rule is applied by the client summary and by order placement, so
//! the amount a shopper sees is the amount the order records.

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Flat-fee shipping that becomes free above a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Money,
    /// Fee charged below the threshold.
    pub fee: Money,
}

impl ShippingPolicy {
    #[must_use]
    pub const fn new(free_threshold: Money, fee: Money) -> Self {
        Self { free_threshold, fee }
    }

    /// Shipping cost for a non-empty cart with the given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_threshold {
            Money::ZERO
        } else {
            self.fee
        }
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Money::from_rubles(3000),
            fee: Money::from_rubles(350),
        }
    }
}

/// Totals derived from a list of `(unit price, quantity)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: i64,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl CartTotals {
    /// Compute totals. An empty cart ships for free.
    pub fn compute<I>(lines: I, policy: &ShippingPolicy) -> Self
    where
        I: IntoIterator<Item = (Money, i32)>,
    {
        let mut item_count = 0_i64;
        let mut subtotal = Money::ZERO;
        for (price, quantity) in lines {
            item_count += i64::from(quantity);
            subtotal = subtotal + price.times(quantity);
        }

        let shipping = if item_count == 0 {
            Money::ZERO
        } else {
            policy.shipping_for(subtotal)
        };

        Self {
            item_count,
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rub(n: i64) -> Money {
        Money::from_rubles(n)
    }

    #[test]
    fn test_below_threshold_pays_fee() {
        let totals = CartTotals::compute(
            [(rub(1200), 1), (rub(480), 2), (rub(640), 1)],
            &ShippingPolicy::default(),
        );
        assert_eq!(totals.subtotal, rub(2800));
        assert_eq!(totals.shipping, rub(350));
        assert_eq!(totals.total, rub(3150));
        assert_eq!(totals.item_count, 4);
    }

    #[test]
    fn test_at_or_above_threshold_is_free() {
        let policy = ShippingPolicy::default();
        let totals = CartTotals::compute([(rub(1600), 2)], &policy);
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, rub(3200));

        let exact = CartTotals::compute([(rub(1000), 3)], &policy);
        assert_eq!(exact.shipping, Money::ZERO);
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let totals = CartTotals::compute(std::iter::empty(), &ShippingPolicy::default());
        assert!(totals.is_empty());
        assert_eq!(totals.total, Money::ZERO);
    }

    #[test]
    fn test_custom_policy() {
        let policy = ShippingPolicy::new(rub(500), rub(99));
        assert_eq!(policy.shipping_for(rub(499)), rub(99));
        assert_eq!(policy.shipping_for(rub(500)), Money::ZERO);
    }
}
