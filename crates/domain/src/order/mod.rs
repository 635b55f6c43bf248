//! The order record and its value objects.

mod record;
mod status;
mod value_objects;

pub use record::{Order, OrderDraft};
pub use status::{OrderStatus, PaymentStatus, TransitionPolicy};
pub use value_objects::{
    Address, DraftLine, InvoiceNumber, OrderCode, OrderLine, PaymentDetails, PaymentMethod,
    StatusChange, Variant,
};

use common::ProductId;
use thiserror::Error;

/// Shape errors detected before any storage work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderValidationError {
    /// The draft contains no line items.
    #[error("Order must contain at least one product")]
    NoLines,

    /// A line item requests a non-positive quantity.
    #[error("Quantity must be a positive integer for product {product_id}")]
    ZeroQuantity { product_id: ProductId },

    /// The same product appears on more than one line.
    #[error("Product {product_id} appears more than once in the order")]
    DuplicateLine { product_id: ProductId },
}
