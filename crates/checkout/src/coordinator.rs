//! The order transaction coordinator.

use std::collections::HashMap;

use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use domain::{
    CouponError, CouponSnapshot, EligibilityContext, Money, Order, OrderCode, OrderDraft,
    OrderLine, OrderStatistics, OrderStatus, PaymentDetails, PaymentStatus, Pricing, StatusChange,
    TransitionPolicy, check_eligibility, idgen, price_order,
};
use order_store::{
    OrderFilter, OrderPage, OrderStore, PageRequest, ProductSnapshot, StockReservation, StoreError,
};

use crate::error::{CheckoutError, Result};
use crate::notify::NotifySink;

/// Tunables for the coordinator.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Flat shipping fee charged on every order.
    pub shipping_fee: Money,
    /// Currency code recorded on payment details.
    pub currency: String,
    /// How many identifier collisions to absorb before giving up.
    pub identifier_retry_limit: u32,
    /// Which status transitions the update operation accepts.
    pub transition_policy: TransitionPolicy,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_fee: Money::from_minor(100),
            currency: "BDT".to_string(),
            identifier_retry_limit: 5,
            transition_policy: TransitionPolicy::Strict,
        }
    }
}

/// Everything computed before the atomic section: resolved products,
/// priced lines, coupon decision, and the reservations to apply.
struct PreparedOrder {
    products: HashMap<ProductId, ProductSnapshot>,
    lines: Vec<OrderLine>,
    reservations: Vec<StockReservation>,
    pricing: Pricing,
    coupon: Option<CouponSnapshot>,
}

/// Coordinates a single order-creation attempt through
/// validating → pricing → reserving+persisting, then fires the notify
/// sink outside the transaction boundary.
///
/// Collaborators are injected so the coordinator can be tested against
/// [`order_store::InMemoryOrderStore`] and a recording sink.
pub struct CheckoutCoordinator<S, N> {
    store: S,
    notify: N,
    config: CheckoutConfig,
}

impl<S, N> CheckoutCoordinator<S, N>
where
    S: OrderStore,
    N: NotifySink + Clone + Send + Sync + 'static,
{
    /// Creates a coordinator with the default configuration.
    pub fn new(store: S, notify: N) -> Self {
        Self::with_config(store, notify, CheckoutConfig::default())
    }

    /// Creates a coordinator with an explicit configuration.
    pub fn with_config(store: S, notify: N, config: CheckoutConfig) -> Self {
        Self {
            store,
            notify,
            config,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order.
    ///
    /// The stock pre-check here is advisory; the authoritative check is
    /// the write-time guard inside [`OrderStore::create_order`]. A guard
    /// failure is retried once with a fresh product read; identifier
    /// collisions are retried up to the configured bound with fresh
    /// identifiers. Nothing is visible to other requests until the
    /// storage transaction commits.
    #[tracing::instrument(skip(self, draft), fields(user_id = %user_id))]
    pub async fn place_order(&self, user_id: UserId, draft: OrderDraft) -> Result<Order> {
        let started = std::time::Instant::now();
        draft.validate()?;

        let mut prepared = self.prepare(user_id, &draft).await?;

        let mut attempt = 0;
        let mut stock_retry_used = false;
        let order = loop {
            attempt += 1;
            let now = Utc::now();
            let sequence = self.store.next_invoice_sequence(now.date_naive()).await?;
            let order = self.build_order(user_id, &draft, &prepared, now, sequence);

            match self.store.create_order(&order, &prepared.reservations).await {
                Ok(()) => break order,
                Err(StoreError::DuplicateIdentifier { field }) => {
                    if attempt >= self.config.identifier_retry_limit {
                        metrics::counter!("order_placement_conflicts_total").increment(1);
                        return Err(CheckoutError::IdentifierExhausted);
                    }
                    tracing::warn!(field, attempt, "identifier collision, retrying");
                }
                Err(StoreError::StockConflict { product_id }) => {
                    if stock_retry_used {
                        metrics::counter!("order_placement_conflicts_total").increment(1);
                        return Err(prepared.insufficient_stock(product_id));
                    }
                    stock_retry_used = true;
                    tracing::warn!(
                        %product_id,
                        "stock guard failed at write time, re-reading products"
                    );
                    // Fresh read re-validates availability and re-prices;
                    // if stock really ran out this surfaces the conflict.
                    prepared = self.prepare(user_id, &draft).await?;
                }
                Err(other) => return Err(other.into()),
            }
        };

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_code = %order.code,
            invoice_number = %order.invoice_number,
            final_amount = order.final_amount.minor(),
            "order committed"
        );

        // Best-effort notification, detached from the caller's success
        // path. Failures are logged, never propagated.
        let sink = self.notify.clone();
        let committed = order.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.order_placed(&committed).await {
                tracing::warn!(
                    error = %e,
                    order_code = %committed.code,
                    "order notification failed"
                );
            }
        });

        Ok(order)
    }

    /// Resolves products, prices the cart, and settles the coupon.
    ///
    /// The first-order-only count runs before the order transaction; two
    /// concurrent first orders by one user can both pass it. Accepted
    /// consistency gap.
    async fn prepare(&self, user_id: UserId, draft: &OrderDraft) -> Result<PreparedOrder> {
        let snapshots = self.store.products_by_ids(&draft.product_ids()).await?;
        let products: HashMap<ProductId, ProductSnapshot> =
            snapshots.into_iter().map(|p| (p.id, p)).collect();

        let mut lines = Vec::with_capacity(draft.lines.len());
        let mut reservations = Vec::with_capacity(draft.lines.len());
        for requested in &draft.lines {
            let product = products.get(&requested.product_id).ok_or(
                CheckoutError::ProductNotFound {
                    product_id: requested.product_id,
                },
            )?;
            if product.stock < requested.quantity as i64 {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    title: product.title.clone(),
                    requested: requested.quantity,
                    available: product.stock,
                });
            }

            lines.push(OrderLine {
                product_id: product.id,
                title: product.title.clone(),
                quantity: requested.quantity,
                unit_price: product.effective_price(),
                variant: requested.variant.clone(),
            });
            reservations.push(StockReservation {
                product_id: product.id,
                quantity: requested.quantity,
            });
        }

        let subtotal: Money = lines.iter().map(OrderLine::line_total).sum();

        let coupon = match draft.coupon_id {
            Some(coupon_id) => Some(
                self.store
                    .coupon_by_id(coupon_id)
                    .await?
                    .ok_or(CheckoutError::Coupon(CouponError::NotFound))?,
            ),
            None => None,
        };

        let discount = match &coupon {
            Some(snapshot) => {
                let prior_orders = if snapshot.first_order_only {
                    self.store.order_count_for_user(user_id).await?
                } else {
                    0
                };
                Some(check_eligibility(
                    snapshot,
                    &EligibilityContext {
                        subtotal,
                        prior_orders,
                        now: Utc::now(),
                    },
                )?)
            }
            None => None,
        };

        let pricing = price_order(&lines, discount, self.config.shipping_fee);

        Ok(PreparedOrder {
            products,
            lines,
            reservations,
            pricing,
            coupon,
        })
    }

    fn build_order(
        &self,
        user_id: UserId,
        draft: &OrderDraft,
        prepared: &PreparedOrder,
        now: chrono::DateTime<Utc>,
        invoice_sequence: u32,
    ) -> Order {
        let Pricing {
            subtotal,
            discount_amount,
            shipping_fee,
            final_amount,
        } = prepared.pricing;

        Order {
            id: OrderId::new(),
            code: idgen::order_code(now),
            invoice_number: idgen::invoice_number(now, invoice_sequence),
            user_id,
            lines: prepared.lines.clone(),
            shipping_address: draft.shipping_address.clone(),
            billing_address: draft.billing_or_shipping().clone(),
            status: OrderStatus::Pending,
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                changed_at: now,
                changed_by: user_id,
            }],
            payment_status: PaymentStatus::Pending,
            payment: PaymentDetails {
                gateway: draft.payment_method.gateway().to_string(),
                method: draft.payment_method,
                amount: final_amount,
                currency: self.config.currency.clone(),
                transaction_id: idgen::transaction_id(user_id, now),
            },
            subtotal,
            discount_amount,
            shipping_fee,
            final_amount,
            coupon_id: prepared.coupon.as_ref().map(|c| c.id),
            promo_code: prepared.coupon.as_ref().map(|c| c.promo_code.clone()),
            notes: draft.notes.clone(),
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves an order to a new status, appending one history entry.
    ///
    /// The transition must be permitted by the configured
    /// [`TransitionPolicy`].
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        changed_by: UserId,
    ) -> Result<Order> {
        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !self.config.transition_policy.allows(order.status, new_status) {
            return Err(CheckoutError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        let updated = self
            .store
            .record_status_change(
                order_id,
                StatusChange {
                    status: new_status,
                    changed_at: Utc::now(),
                    changed_by,
                },
            )
            .await?;

        tracing::info!(
            order_code = %updated.code,
            from = %order.status,
            to = %new_status,
            "order status updated"
        );

        Ok(updated)
    }

    /// Loads an order by surrogate id.
    pub async fn order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.store.order_by_id(order_id).await?)
    }

    /// Loads an order by its human-readable code.
    pub async fn order_by_code(&self, code: &OrderCode) -> Result<Option<Order>> {
        Ok(self.store.order_by_code(code).await?)
    }

    /// Returns a newest-first page of orders.
    pub async fn list_orders(&self, filter: OrderFilter, page: PageRequest) -> Result<OrderPage> {
        Ok(self.store.list_orders(filter, page).await?)
    }

    /// Dashboard statistics over all committed orders.
    pub async fn statistics(&self) -> Result<OrderStatistics> {
        Ok(self.store.statistics(Utc::now()).await?)
    }
}

impl PreparedOrder {
    /// Builds the client-facing conflict for a product whose write-time
    /// guard failed twice.
    fn insufficient_stock(&self, product_id: ProductId) -> CheckoutError {
        let requested = self
            .reservations
            .iter()
            .find(|r| r.product_id == product_id)
            .map(|r| r.quantity)
            .unwrap_or(0);
        let (title, available) = self
            .products
            .get(&product_id)
            .map(|p| (p.title.clone(), p.stock))
            .unwrap_or_else(|| (product_id.to_string(), 0));

        CheckoutError::InsufficientStock {
            product_id,
            title,
            requested,
            available,
        }
    }
}
