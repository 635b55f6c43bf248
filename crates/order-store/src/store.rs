use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{CouponId, OrderId, ProductId, UserId};
use domain::{CouponSnapshot, Order, OrderCode, OrderStatistics, StatusChange};

use crate::Result;
use crate::types::{OrderFilter, OrderPage, PageRequest, ProductSnapshot, StockReservation};

/// Storage contract for the order core.
///
/// Implementations must be thread-safe; every method is an independent
/// unit of work except [`create_order`](OrderStore::create_order), which
/// is the one multi-document atomic operation in the system.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads product snapshots for the given id set.
    ///
    /// Ids that do not resolve are simply absent from the result; the
    /// caller decides whether that is an error.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>>;

    /// Looks up a coupon by id.
    async fn coupon_by_id(&self, id: CouponId) -> Result<Option<CouponSnapshot>>;

    /// Looks up a coupon by its promo code.
    async fn coupon_by_code(&self, code: &str) -> Result<Option<CouponSnapshot>>;

    /// Counts orders previously placed by a user (first-order-only
    /// coupon check).
    async fn order_count_for_user(&self, user_id: UserId) -> Result<u64>;

    /// Issues the next invoice sequence number for a day.
    ///
    /// Backed by a storage-native atomic counter so two concurrent
    /// orders on the same day never observe the same sequence.
    async fn next_invoice_sequence(&self, day: NaiveDate) -> Result<u32>;

    /// Persists an order and applies every stock reservation as one
    /// atomic unit.
    ///
    /// Each decrement is guarded by `stock >= quantity` evaluated at
    /// write time. On any failure, whether a failed guard
    /// ([`StoreError::StockConflict`]) or a unique-index violation on
    /// the order code or invoice number
    /// ([`StoreError::DuplicateIdentifier`]), nothing is committed: no
    /// order row and no decrement survives.
    ///
    /// [`StoreError::StockConflict`]: crate::StoreError::StockConflict
    /// [`StoreError::DuplicateIdentifier`]: crate::StoreError::DuplicateIdentifier
    async fn create_order(&self, order: &Order, reservations: &[StockReservation]) -> Result<()>;

    /// Loads an order by its surrogate id.
    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads an order by its human-readable code.
    async fn order_by_code(&self, code: &OrderCode) -> Result<Option<Order>>;

    /// Returns a newest-first page of orders.
    async fn list_orders(&self, filter: OrderFilter, page: PageRequest) -> Result<OrderPage>;

    /// Sets the order's status and appends one history entry, returning
    /// the updated order. History is append-only: entries are never
    /// rewritten or removed.
    async fn record_status_change(&self, id: OrderId, change: StatusChange) -> Result<Order>;

    /// Read-only dashboard rollup: today's and this month's order count
    /// and successful-payment sales, plus all-time status counts.
    async fn statistics(&self, now: DateTime<Utc>) -> Result<OrderStatistics>;
}
