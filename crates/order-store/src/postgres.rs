use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use common::{CouponId, OrderId, ProductId, UserId};
use domain::{
    CouponSnapshot, Discount, Money, Order, OrderCode, OrderStatistics, OrderStatus, StatusChange,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::OrderStore;
use crate::types::{
    OrderFilter, OrderPage, PageRequest, Pagination, ProductSnapshot, StockReservation,
};

const ORDER_COLUMNS: &str = "id, order_code, invoice_number, user_id, lines, shipping_address, \
     billing_address, order_status, status_history, payment_status, payment, subtotal, \
     discount_amount, shipping_fee, final_amount, coupon_id, promo_code, notes, delivered_at, \
     created_at, updated_at";

/// PostgreSQL-backed order store.
///
/// `create_order` runs the order insert and all guarded decrements inside
/// one transaction; the stock guard is the `AND stock >= $2` predicate on
/// the UPDATE itself, so it holds at write time regardless of what was
/// read earlier.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: OrderStatus = text_enum(row.try_get("order_status")?)?;
        let payment_status = text_enum(row.try_get("payment_status")?)?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            code: OrderCode::new(row.try_get::<String, _>("order_code")?),
            invoice_number: domain::InvoiceNumber::new(row.try_get::<String, _>("invoice_number")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            lines: serde_json::from_value(row.try_get("lines")?)?,
            shipping_address: serde_json::from_value(row.try_get("shipping_address")?)?,
            billing_address: serde_json::from_value(row.try_get("billing_address")?)?,
            status,
            status_history: serde_json::from_value(row.try_get("status_history")?)?,
            payment_status,
            payment: serde_json::from_value(row.try_get("payment")?)?,
            subtotal: Money::from_minor(row.try_get("subtotal")?),
            discount_amount: Money::from_minor(row.try_get("discount_amount")?),
            shipping_fee: Money::from_minor(row.try_get("shipping_fee")?),
            final_amount: Money::from_minor(row.try_get("final_amount")?),
            coupon_id: row
                .try_get::<Option<Uuid>, _>("coupon_id")?
                .map(CouponId::from_uuid),
            promo_code: row.try_get("promo_code")?,
            notes: row.try_get("notes")?,
            delivered_at: row.try_get("delivered_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_coupon(row: PgRow) -> Result<CouponSnapshot> {
        let discount_type: String = row.try_get("discount_type")?;
        let discount_value: i64 = row.try_get("discount_value")?;
        let discount = if discount_type == "percentage" {
            Discount::Percentage(discount_value as u32)
        } else {
            Discount::Fixed(Money::from_minor(discount_value))
        };

        Ok(CouponSnapshot {
            id: CouponId::from_uuid(row.try_get::<Uuid, _>("id")?),
            promo_code: row.try_get("promo_code")?,
            discount,
            minimum_order_value: Money::from_minor(row.try_get("minimum_order_value")?),
            first_order_only: row.try_get("first_order_only")?,
            starts_at: row.try_get("starts_at")?,
            expires_at: row.try_get("expires_at")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

/// Decodes a TEXT column holding a serde unit-variant name.
fn text_enum<T: serde::de::DeserializeOwned>(value: String) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(value))?)
}

/// `[start, end)` bounds of the UTC day containing `now`.
fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    (start, start + chrono::Duration::days(1))
}

/// `[start, end)` bounds of the UTC calendar month containing `now`.
fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = now.date_naive();
    let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap();
    let end = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
    };
    (
        start.and_hms_opt(0, 0, 0).unwrap().and_utc(),
        end.and_hms_opt(0, 0, 0).unwrap().and_utc(),
    )
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query(
            "SELECT id, title, stock, base_price, final_price FROM products WHERE id = ANY($1)",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ProductSnapshot {
                    id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    title: row.try_get("title")?,
                    stock: row.try_get("stock")?,
                    base_price: Money::from_minor(row.try_get("base_price")?),
                    final_price: row
                        .try_get::<Option<i64>, _>("final_price")?
                        .map(Money::from_minor),
                })
            })
            .collect()
    }

    async fn coupon_by_id(&self, id: CouponId) -> Result<Option<CouponSnapshot>> {
        let row = sqlx::query(
            "SELECT id, promo_code, discount_type, discount_value, minimum_order_value, \
             first_order_only, starts_at, expires_at, is_active FROM coupons WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_coupon).transpose()
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<CouponSnapshot>> {
        let row = sqlx::query(
            "SELECT id, promo_code, discount_type, discount_value, minimum_order_value, \
             first_order_only, starts_at, expires_at, is_active FROM coupons WHERE promo_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_coupon).transpose()
    }

    async fn order_count_for_user(&self, user_id: UserId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn next_invoice_sequence(&self, day: NaiveDate) -> Result<u32> {
        let seq: i64 = sqlx::query_scalar(
            "INSERT INTO invoice_counters (day, seq) VALUES ($1, 1) \
             ON CONFLICT (day) DO UPDATE SET seq = invoice_counters.seq + 1 \
             RETURNING seq",
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;
        Ok(seq as u32)
    }

    #[tracing::instrument(skip(self, order, reservations), fields(order_code = %order.code))]
    async fn create_order(&self, order: &Order, reservations: &[StockReservation]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, order_code, invoice_number, user_id, lines, \
             shipping_address, billing_address, order_status, status_history, payment_status, \
             payment, subtotal, discount_amount, shipping_fee, final_amount, coupon_id, \
             promo_code, notes, delivered_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21)",
        )
        .bind(order.id.as_uuid())
        .bind(order.code.as_str())
        .bind(order.invoice_number.as_str())
        .bind(order.user_id.as_uuid())
        .bind(serde_json::to_value(&order.lines)?)
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(serde_json::to_value(&order.billing_address)?)
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.status_history)?)
        .bind(order.payment_status.as_str())
        .bind(serde_json::to_value(&order.payment)?)
        .bind(order.subtotal.minor())
        .bind(order.discount_amount.minor())
        .bind(order.shipping_fee.minor())
        .bind(order.final_amount.minor())
        .bind(order.coupon_id.map(|c| c.as_uuid()))
        .bind(&order.promo_code)
        .bind(&order.notes)
        .bind(order.delivered_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some("unique_order_code") => {
                        return StoreError::DuplicateIdentifier {
                            field: "order_code",
                        };
                    }
                    Some("unique_invoice_number") => {
                        return StoreError::DuplicateIdentifier {
                            field: "invoice_number",
                        };
                    }
                    _ => {}
                }
            }
            StoreError::Database(e)
        })?;

        for reservation in reservations {
            let result =
                sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                    .bind(reservation.product_id.as_uuid())
                    .bind(reservation.quantity as i64)
                    .execute(&mut *tx)
                    .await?;

            if result.rows_affected() != 1 {
                // Dropping the transaction rolls back the insert and any
                // decrement already applied in this unit.
                return Err(StoreError::StockConflict {
                    product_id: reservation.product_id,
                });
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn order_by_code(&self, code: &OrderCode) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self, filter: OrderFilter, page: PageRequest) -> Result<OrderPage> {
        let (rows, total_count) = match filter.user_id {
            Some(user_id) => {
                let rows = sqlx::query(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                ))
                .bind(user_id.as_uuid())
                .bind(page.limit as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await?;

                let count: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
                        .bind(user_id.as_uuid())
                        .fetch_one(&self.pool)
                        .await?;
                (rows, count as u64)
            }
            None => {
                let rows = sqlx::query(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(page.limit as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await?;

                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?;
                (rows, count as u64)
            }
        };

        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderPage {
            orders,
            pagination: Pagination::new(page, total_count),
        })
    }

    async fn record_status_change(&self, id: OrderId, change: StatusChange) -> Result<Order> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET order_status = $2, \
             status_history = status_history || $3::jsonb, updated_at = $4 \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(change.status.as_str())
        .bind(serde_json::to_value(&change)?)
        .bind(change.changed_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::OrderNotFound(id)),
        }
    }

    async fn statistics(&self, now: DateTime<Utc>) -> Result<OrderStatistics> {
        let mut stats = OrderStatistics::default();

        for (bounds, totals) in [
            (day_bounds(now), &mut stats.today),
            (month_bounds(now), &mut stats.this_month),
        ] {
            let row = sqlx::query(
                "SELECT COUNT(*) AS orders, \
                 COALESCE(SUM(final_amount) FILTER (WHERE payment_status = 'Success'), 0)::BIGINT \
                 AS sales FROM orders WHERE created_at >= $1 AND created_at < $2",
            )
            .bind(bounds.0)
            .bind(bounds.1)
            .fetch_one(&self.pool)
            .await?;

            totals.orders = row.try_get::<i64, _>("orders")? as u64;
            totals.sales = Money::from_minor(row.try_get("sales")?);
        }

        let rows = sqlx::query("SELECT order_status, COUNT(*) AS count FROM orders GROUP BY order_status")
            .fetch_all(&self.pool)
            .await?;
        for row in rows {
            let status: OrderStatus = text_enum(row.try_get("order_status")?)?;
            let count = row.try_get::<i64, _>("count")? as u64;
            match status {
                OrderStatus::Pending => stats.status_counts.pending = count,
                OrderStatus::Processing => stats.status_counts.processing = count,
                OrderStatus::Delivered => stats.status_counts.delivered = count,
                OrderStatus::Cancelled => stats.status_counts.cancelled = count,
            }
        }

        Ok(stats)
    }
}
