use common::{OrderId, ProductId};
use thiserror::Error;

/// Errors surfaced by order storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write-time stock guard failed: the product's stock dropped below
    /// the requested quantity between read and write (or the product row
    /// disappeared). The whole transaction was rolled back.
    #[error("Stock guard failed for product {product_id}")]
    StockConflict { product_id: ProductId },

    /// A unique index rejected the order's `order_code` or
    /// `invoice_number`. The caller may retry with fresh identifiers.
    #[error("Duplicate {field} on order insert")]
    DuplicateIdentifier { field: &'static str },

    /// The order was not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
