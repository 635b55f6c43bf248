//! Coupon snapshots and eligibility checking.
//!
//! Coupons are owned by an external admin workflow; the order core reads
//! a snapshot and validates it against the requesting context. All checks
//! here are pure; the prior-order count is supplied by the caller.

use chrono::{DateTime, Utc};
use common::CouponId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::pricing::Discount;

/// Read-only view of a coupon as stored by the admin workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponSnapshot {
    pub id: CouponId,
    pub promo_code: String,
    pub discount: Discount,
    pub minimum_order_value: Money,
    pub first_order_only: bool,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

/// What the eligibility check needs to know about the requesting order.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext {
    /// Subtotal of the order being placed, before any discount.
    pub subtotal: Money,
    /// How many orders the requesting user has already placed. Counted
    /// before the order transaction starts; two concurrent first orders
    /// can both observe zero (accepted race, see the coordinator docs).
    pub prior_orders: u64,
    pub now: DateTime<Utc>,
}

/// Why a coupon cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// The coupon does not resolve or has been deactivated.
    #[error("Coupon not found or inactive")]
    NotFound,

    /// The coupon's start date is in the future.
    #[error("Coupon is not yet active")]
    NotStarted,

    /// The coupon's expiration date has passed.
    #[error("Coupon has expired")]
    Expired,

    /// The order subtotal is below the coupon's minimum.
    #[error("Order value must be at least {minimum} to use this coupon")]
    MinimumOrderNotMet { minimum: Money },

    /// The coupon is restricted to a user's first order.
    #[error("Coupon is only applicable to a first order")]
    FirstOrderOnly,
}

/// Validates a coupon against the requesting context.
///
/// On success returns the discount parameters for the pricing engine.
pub fn check_eligibility(
    coupon: &CouponSnapshot,
    ctx: &EligibilityContext,
) -> Result<Discount, CouponError> {
    if !coupon.is_active {
        return Err(CouponError::NotFound);
    }
    if ctx.now < coupon.starts_at {
        return Err(CouponError::NotStarted);
    }
    if ctx.now > coupon.expires_at {
        return Err(CouponError::Expired);
    }
    if ctx.subtotal < coupon.minimum_order_value {
        return Err(CouponError::MinimumOrderNotMet {
            minimum: coupon.minimum_order_value,
        });
    }
    if coupon.first_order_only && ctx.prior_orders >= 1 {
        return Err(CouponError::FirstOrderOnly);
    }

    Ok(coupon.discount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon() -> CouponSnapshot {
        let now = Utc::now();
        CouponSnapshot {
            id: CouponId::new(),
            promo_code: "WELCOME10".to_string(),
            discount: Discount::Percentage(10),
            minimum_order_value: Money::from_minor(1000),
            first_order_only: false,
            starts_at: now - Duration::days(1),
            expires_at: now + Duration::days(1),
            is_active: true,
        }
    }

    fn ctx(subtotal: i64) -> EligibilityContext {
        EligibilityContext {
            subtotal: Money::from_minor(subtotal),
            prior_orders: 0,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_eligible_coupon_returns_discount() {
        let result = check_eligibility(&coupon(), &ctx(1300));
        assert_eq!(result, Ok(Discount::Percentage(10)));
    }

    #[test]
    fn test_inactive_coupon_is_not_found() {
        let mut c = coupon();
        c.is_active = false;
        assert_eq!(check_eligibility(&c, &ctx(1300)), Err(CouponError::NotFound));
    }

    #[test]
    fn test_future_coupon_not_started() {
        let mut c = coupon();
        c.starts_at = Utc::now() + Duration::days(2);
        assert_eq!(
            check_eligibility(&c, &ctx(1300)),
            Err(CouponError::NotStarted)
        );
    }

    #[test]
    fn test_past_coupon_expired() {
        let mut c = coupon();
        c.expires_at = Utc::now() - Duration::hours(1);
        assert_eq!(check_eligibility(&c, &ctx(1300)), Err(CouponError::Expired));
    }

    #[test]
    fn test_minimum_order_enforced() {
        assert_eq!(
            check_eligibility(&coupon(), &ctx(999)),
            Err(CouponError::MinimumOrderNotMet {
                minimum: Money::from_minor(1000)
            })
        );
        // Exactly the minimum qualifies.
        assert!(check_eligibility(&coupon(), &ctx(1000)).is_ok());
    }

    #[test]
    fn test_first_order_only_rejects_repeat_customer() {
        let mut c = coupon();
        c.first_order_only = true;

        let mut context = ctx(1300);
        context.prior_orders = 1;
        assert_eq!(
            check_eligibility(&c, &context),
            Err(CouponError::FirstOrderOnly)
        );

        context.prior_orders = 0;
        assert!(check_eligibility(&c, &context).is_ok());
    }

    #[test]
    fn test_check_order_matches_original() {
        // Temporal checks run before the minimum-order check: an expired
        // coupon on a too-small order reports Expired.
        let mut c = coupon();
        c.expires_at = Utc::now() - Duration::hours(1);
        assert_eq!(check_eligibility(&c, &ctx(1)), Err(CouponError::Expired));
    }
}
