//! Domain layer for the order backend.
//!
//! This crate holds everything that can be computed without I/O:
//! - Money arithmetic in integral minor units
//! - The order record, its value objects, and the status state machine
//! - The pricing engine (subtotal, discount, shipping, final amount)
//! - Coupon eligibility checking over a coupon snapshot
//! - Order code / invoice number / transaction id generation
//! - Statistics report types for the read side

pub mod coupon;
pub mod idgen;
pub mod money;
pub mod order;
pub mod pricing;
pub mod stats;

pub use coupon::{CouponError, CouponSnapshot, EligibilityContext, check_eligibility};
pub use money::Money;
pub use order::{
    Address, DraftLine, InvoiceNumber, Order, OrderCode, OrderDraft, OrderLine, OrderStatus,
    OrderValidationError, PaymentDetails, PaymentMethod, PaymentStatus, StatusChange,
    TransitionPolicy, Variant,
};
pub use pricing::{Discount, Pricing, price_order};
pub use stats::{OrderStatistics, PeriodTotals, StatusBreakdown};
