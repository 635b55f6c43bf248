//! Order pricing: subtotal, discount, shipping, final amount.
//!
//! Pure and deterministic so it can be unit-tested in isolation; the
//! coordinator feeds it lines whose unit prices were read in the same
//! transaction scope as the stock check.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::OrderLine;

/// Discount parameters produced by a validated coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Discount {
    /// Percent of the subtotal, 0–100.
    Percentage(u32),
    /// Flat amount in minor units.
    Fixed(Money),
}

/// The computed money figures for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub shipping_fee: Money,
    pub final_amount: Money,
}

/// Prices an order.
///
/// `subtotal = Σ unit_price · quantity`. The discount is clamped to
/// `[0, subtotal]`; a percentage discount is floored to a minor unit,
/// which rounds the charged amount up, never down, matching
/// `final = ceil(subtotal − discount) + shipping_fee`.
pub fn price_order(lines: &[OrderLine], discount: Option<Discount>, shipping_fee: Money) -> Pricing {
    let subtotal: Money = lines.iter().map(OrderLine::line_total).sum();

    let discount_amount = match discount {
        Some(Discount::Percentage(percent)) => subtotal.percentage(percent),
        Some(Discount::Fixed(amount)) => amount,
        None => Money::zero(),
    }
    .clamp(Money::zero(), subtotal);

    Pricing {
        subtotal,
        discount_amount,
        shipping_fee,
        final_amount: subtotal - discount_amount + shipping_fee,
    }
}
