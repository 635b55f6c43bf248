//! Checkout error taxonomy.

use common::{OrderId, ProductId};
use domain::{CouponError, OrderStatus, OrderValidationError};
use order_store::StoreError;
use thiserror::Error;

/// Machine-checkable failure category reported alongside every error
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input shape; rejected before any storage work.
    Validation,
    /// A product, coupon, or order reference does not resolve.
    NotFound,
    /// The order lost to concurrent state: stock, coupon eligibility, or
    /// identifier allocation.
    Conflict,
    /// Storage or transport failure.
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while placing or updating an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The draft failed shape validation.
    #[error(transparent)]
    Validation(#[from] OrderValidationError),

    /// A referenced product does not exist.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A product cannot cover the requested quantity.
    #[error("Insufficient stock for product {title}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        title: String,
        requested: u32,
        available: i64,
    },

    /// The coupon does not resolve or is not eligible.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Every identifier attempt collided with an existing order.
    #[error("Could not allocate a unique order identifier, please retry")]
    IdentifierExhausted,

    /// The order was not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status change is not permitted by the transition
    /// policy.
    #[error("Order status cannot change from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Storage failure. The message shown to callers stays generic; the
    /// underlying error is logged at the API boundary.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl CheckoutError {
    /// Returns the stable category for this failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckoutError::Validation(_) => ErrorCategory::Validation,
            CheckoutError::ProductNotFound { .. } | CheckoutError::OrderNotFound(_) => {
                ErrorCategory::NotFound
            }
            CheckoutError::Coupon(CouponError::NotFound) => ErrorCategory::NotFound,
            CheckoutError::Coupon(_)
            | CheckoutError::InsufficientStock { .. }
            | CheckoutError::IdentifierExhausted
            | CheckoutError::InvalidTransition { .. } => ErrorCategory::Conflict,
            CheckoutError::Store(_) => ErrorCategory::Internal,
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => CheckoutError::OrderNotFound(id),
            other => CheckoutError::Store(other),
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            CheckoutError::Validation(OrderValidationError::NoLines).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CheckoutError::ProductNotFound {
                product_id: ProductId::new()
            }
            .category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            CheckoutError::Coupon(CouponError::NotFound).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            CheckoutError::Coupon(CouponError::Expired).category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            CheckoutError::IdentifierExhausted.category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            CheckoutError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            }
            .category(),
            ErrorCategory::Conflict
        );
    }

    #[test]
    fn test_store_order_not_found_converts_to_not_found() {
        let id = OrderId::new();
        let err: CheckoutError = StoreError::OrderNotFound(id).into();
        assert!(matches!(err, CheckoutError::OrderNotFound(found) if found == id));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_category_strings() {
        assert_eq!(ErrorCategory::Validation.as_str(), "validation");
        assert_eq!(ErrorCategory::NotFound.as_str(), "not_found");
        assert_eq!(ErrorCategory::Conflict.as_str(), "conflict");
        assert_eq!(ErrorCategory::Internal.as_str(), "internal");
    }
}
