//! Shared identifier types used across the order backend.
//!
//! Every entity reference is a UUID wrapped in its own newtype so that a
//! product id can never be passed where a user id is expected.

pub mod types;

pub use types::{CouponId, OrderId, ProductId, UserId};
