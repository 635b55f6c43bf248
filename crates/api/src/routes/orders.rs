//! Order placement, lookup, status-update, and statistics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use checkout::{CheckoutCoordinator, LoggingNotifySink};
use chrono::{DateTime, Utc};
use common::{CouponId, OrderId, UserId};
use domain::{
    Address, DraftLine, InvoiceNumber, Money, Order, OrderCode, OrderDraft, OrderStatistics,
    OrderStatus, PaymentMethod, PaymentStatus,
};
use order_store::{OrderFilter, OrderStore, PageRequest, Pagination};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub coordinator: CheckoutCoordinator<S, LoggingNotifySink>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub products: Vec<DraftLine>,
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub coupon_id: Option<CouponId>,
    #[serde(default)]
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
}

impl From<PlaceOrderRequest> for OrderDraft {
    fn from(req: PlaceOrderRequest) -> Self {
        OrderDraft {
            lines: req.products,
            shipping_address: req.shipping_address,
            billing_address: req.billing_address,
            coupon_id: req.coupon_id,
            notes: req.notes,
            payment_method: req.payment_method,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub order_status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub user: Option<Uuid>,
}

// -- Response types --

/// Compact row for order listings, mirroring what the dashboard shows.
#[derive(Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_code: OrderCode,
    pub invoice_number: InvoiceNumber,
    pub user_id: UserId,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub final_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_code: order.code,
            invoice_number: order.invoice_number,
            user_id: order.user_id,
            order_status: order.status,
            payment_status: order.payment_status,
            final_amount: order.final_amount,
            created_at: order.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderSummary>,
    pub pagination: Pagination,
}

// -- Handlers --

/// POST /orders — place a new order for the calling user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user_id): Caller,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.coordinator.place_order(user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/:id — load an order by surrogate UUID or by order code.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_user_id): Caller,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = match Uuid::parse_str(&id) {
        Ok(uuid) => state.coordinator.order(OrderId::from_uuid(uuid)).await?,
        Err(_) => {
            state
                .coordinator
                .order_by_code(&OrderCode::new(id.as_str()))
                .await?
        }
    };

    order
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))
}

/// GET /orders — paginated listing, newest first, optionally scoped to
/// one user.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_user_id): Caller,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let filter = OrderFilter {
        user_id: params.user.map(UserId::from_uuid),
    };
    let page = PageRequest::new(params.page.unwrap_or(1), params.limit.unwrap_or(20));

    let result = state.coordinator.list_orders(filter, page).await?;

    Ok(Json(OrderListResponse {
        orders: result.orders.into_iter().map(OrderSummary::from).collect(),
        pagination: result.pagination,
    }))
}

/// PATCH /orders/:id/status — move an order to a new status, appending
/// one history entry attributed to the caller.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user_id): Caller,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = Uuid::parse_str(&id)
        .map(OrderId::from_uuid)
        .map_err(|_| ApiError::BadRequest(format!("Invalid order id: {id}")))?;

    let order = state
        .coordinator
        .update_status(order_id, req.order_status, user_id)
        .await?;

    Ok(Json(order))
}

/// GET /orders/statistics — dashboard rollup.
#[tracing::instrument(skip(state))]
pub async fn statistics<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_user_id): Caller,
) -> Result<Json<OrderStatistics>, ApiError> {
    let stats = state.coordinator.statistics().await?;
    Ok(Json(stats))
}
