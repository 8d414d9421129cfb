//! Checkout summary arithmetic.
//!
//! The API owns real pricing. The storefront only re-derives what the order
//! summary panel shows from the cart snapshot it already holds.

use crate::Money;

/// Flat shipping fee charged on every non-empty order.
pub const SHIPPING_FEE: i64 = 50;

/// Totals shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    /// Σ unit price × quantity.
    pub subtotal: Money,
    /// Coupon reduction, zero when no coupon applies.
    pub discount: Money,
    /// Flat fee, zero for an empty cart.
    pub shipping: Money,
    /// Subtotal minus discount plus shipping.
    pub total: Money,
}

impl CheckoutSummary {
    /// Build the summary from cart lines.
    ///
    /// `discounted_subtotal` is the server's `totalPriceAfterDiscount`. It is
    /// honoured only when it is below the computed subtotal; a stale value
    /// left over from an expired coupon never raises the price.
    #[must_use]
    pub fn compute<I>(lines: I, discounted_subtotal: Option<Money>) -> Self
    where
        I: IntoIterator<Item = (Money, u32)>,
    {
        let mut item_count = 0u32;
        let subtotal: Money = lines
            .into_iter()
            .map(|(unit, quantity)| {
                item_count = item_count.saturating_add(quantity);
                unit * quantity
            })
            .sum();

        let discount = match discounted_subtotal {
            Some(after) if after < subtotal && after >= Money::ZERO => subtotal - after,
            _ => Money::ZERO,
        };

        let shipping = if item_count == 0 {
            Money::ZERO
        } else {
            Money::from_units(SHIPPING_FEE)
        };

        Self {
            subtotal,
            discount,
            shipping,
            total: subtotal - discount + shipping,
        }
    }

    /// Whether a coupon reduced the subtotal.
    #[must_use]
    pub fn has_discount(&self) -> bool {
        !self.discount.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_without_discount() {
        let summary = CheckoutSummary::compute([(Money::from_units(100), 2)], None);
        assert_eq!(summary.subtotal, Money::from_units(200));
        assert_eq!(summary.shipping, Money::from_units(50));
        assert_eq!(summary.total, Money::from_units(250));
        assert!(!summary.has_discount());
    }

    #[test]
    fn test_discount_reduces_total() {
        let lines = [(Money::from_units(100), 2), (Money::from_units(40), 1)];
        let summary = CheckoutSummary::compute(lines, Some(Money::from_units(216)));
        assert_eq!(summary.subtotal, Money::from_units(240));
        assert_eq!(summary.discount, Money::from_units(24));
        assert_eq!(summary.total, Money::from_units(266));
    }

    #[test]
    fn test_stale_discount_is_ignored() {
        let summary =
            CheckoutSummary::compute([(Money::from_units(100), 1)], Some(Money::from_units(120)));
        assert_eq!(summary.discount, Money::ZERO);
        assert_eq!(summary.total, Money::from_units(150));
    }

    #[test]
    fn test_absurd_prices_do_not_panic() {
        let huge = Money::new(rust_decimal::Decimal::MAX);
        let summary = CheckoutSummary::compute([(huge, 1_000), (huge, 2)], None);
        assert_eq!(summary.subtotal, huge);
        assert_eq!(summary.total, huge);
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let summary = CheckoutSummary::compute(std::iter::empty(), None);
        assert_eq!(summary.total, Money::ZERO);
        assert_eq!(summary.shipping, Money::ZERO);
    }
}
