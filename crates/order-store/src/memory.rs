use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use common::{CouponId, OrderId, ProductId, UserId};
use domain::{CouponSnapshot, Order, OrderCode, OrderStatistics, StatusChange};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::OrderStore;
use crate::types::{
    OrderFilter, OrderPage, PageRequest, Pagination, ProductSnapshot, StockReservation,
};

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, ProductSnapshot>,
    coupons: HashMap<CouponId, CouponSnapshot>,
    orders: HashMap<OrderId, Order>,
    invoice_counters: HashMap<NaiveDate, u32>,
}

/// In-memory order store for testing.
///
/// A single write lock stands in for the storage transaction: within
/// `create_order` every guard is checked and every mutation applied while
/// the lock is held, so concurrent callers observe all-or-nothing
/// behavior exactly as with the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product into the catalog.
    pub async fn insert_product(&self, product: ProductSnapshot) {
        self.inner.write().await.products.insert(product.id, product);
    }

    /// Seeds a coupon.
    pub async fn insert_coupon(&self, coupon: CouponSnapshot) {
        self.inner.write().await.coupons.insert(coupon.id, coupon);
    }

    /// Returns a product's current stock, if the product exists.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<i64> {
        self.inner
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Total number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.products.get(id).cloned())
            .collect())
    }

    async fn coupon_by_id(&self, id: CouponId) -> Result<Option<CouponSnapshot>> {
        Ok(self.inner.read().await.coupons.get(&id).cloned())
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<CouponSnapshot>> {
        Ok(self
            .inner
            .read()
            .await
            .coupons
            .values()
            .find(|c| c.promo_code == code)
            .cloned())
    }

    async fn order_count_for_user(&self, user_id: UserId) -> Result<u64> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .count() as u64)
    }

    async fn next_invoice_sequence(&self, day: NaiveDate) -> Result<u32> {
        let mut inner = self.inner.write().await;
        let seq = inner.invoice_counters.entry(day).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn create_order(&self, order: &Order, reservations: &[StockReservation]) -> Result<()> {
        let mut inner = self.inner.write().await;

        // Unique-index simulation for the two human-readable identifiers.
        if inner.orders.values().any(|o| o.code == order.code) {
            return Err(StoreError::DuplicateIdentifier {
                field: "order_code",
            });
        }
        if inner
            .orders
            .values()
            .any(|o| o.invoice_number == order.invoice_number)
        {
            return Err(StoreError::DuplicateIdentifier {
                field: "invoice_number",
            });
        }

        // Check every guard before mutating anything, so a late failure
        // cannot leave earlier decrements applied.
        for reservation in reservations {
            let available = inner
                .products
                .get(&reservation.product_id)
                .map(|p| p.stock)
                .unwrap_or(0);
            if available < reservation.quantity as i64 {
                return Err(StoreError::StockConflict {
                    product_id: reservation.product_id,
                });
            }
        }

        for reservation in reservations {
            if let Some(product) = inner.products.get_mut(&reservation.product_id) {
                product.stock -= reservation.quantity as i64;
            }
        }
        inner.orders.insert(order.id, order.clone());

        Ok(())
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn order_by_code(&self, code: &OrderCode) -> Result<Option<Order>> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .values()
            .find(|o| &o.code == code)
            .cloned())
    }

    async fn list_orders(&self, filter: OrderFilter, page: PageRequest) -> Result<OrderPage> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| filter.user_id.is_none_or(|u| o.user_id == u))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total_count = orders.len() as u64;
        let orders: Vec<Order> = orders
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok(OrderPage {
            orders,
            pagination: Pagination::new(page, total_count),
        })
    }

    async fn record_status_change(&self, id: OrderId, change: StatusChange) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;

        order.status = change.status;
        order.updated_at = change.changed_at;
        order.status_history.push(change);

        Ok(order.clone())
    }

    async fn statistics(&self, now: DateTime<Utc>) -> Result<OrderStatistics> {
        let inner = self.inner.read().await;
        let today = now.date_naive();

        let mut stats = OrderStatistics::default();
        for order in inner.orders.values() {
            let created = order.created_at.date_naive();
            if created == today {
                stats.today.record(order.payment_status, order.final_amount);
            }
            if created.year() == today.year() && created.month() == today.month() {
                stats
                    .this_month
                    .record(order.payment_status, order.final_amount);
            }
            stats.status_counts.record(order.status);
        }

        Ok(stats)
    }
}
