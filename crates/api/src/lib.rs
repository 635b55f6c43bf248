//! HTTP API server for the order backend.
//!
//! Exposes order placement, lookup, status updates, and dashboard
//! statistics over REST, with structured logging (tracing) and
//! Prometheus metrics. Authentication happens upstream; the caller
//! identity arrives as an `X-User-Id` header.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use checkout::{CheckoutConfig, CheckoutCoordinator, LoggingNotifySink};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/statistics", get(routes::orders::statistics::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state around a store, with the logging notify
/// sink and the given checkout configuration.
pub fn create_state<S: OrderStore + Clone + 'static>(
    store: S,
    config: CheckoutConfig,
) -> Arc<AppState<S>> {
    let coordinator = CheckoutCoordinator::with_config(store.clone(), LoggingNotifySink::new(), config);
    Arc::new(AppState { coordinator, store })
}

/// Creates application state with the default checkout configuration.
pub fn create_default_state<S: OrderStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    create_state(store, CheckoutConfig::default())
}
