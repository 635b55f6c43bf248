//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{ProductId, UserId};
use domain::Money;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, ProductSnapshot};
use tower::ServiceExt;

use api::routes::orders::AppState;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (Router, Arc<AppState<InMemoryOrderStore>>) {
    let store = InMemoryOrderStore::new();
    let state = api::create_default_state(store);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn seed_product(state: &AppState<InMemoryOrderStore>, stock: i64, price: i64) -> ProductId {
    let product = ProductSnapshot {
        id: ProductId::new(),
        title: "Widget".to_string(),
        stock,
        base_price: Money::from_minor(price),
        final_price: None,
    };
    let id = product.id;
    state.store.insert_product(product).await;
    id
}

fn order_body(product_id: ProductId, quantity: u32) -> serde_json::Value {
    serde_json::json!({
        "products": [{"product_id": product_id, "quantity": quantity}],
        "shipping_address": {
            "full_name": "Test Customer",
            "phone": "01700000000",
            "district": "Dhaka",
            "address_line": "House 1, Road 2",
            "postal_code": "1207"
        },
        "payment_method": "cash-on-delivery"
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<UserId>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_place_order() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 10, 500).await;
    let user = UserId::new();

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(user),
        Some(order_body(product_id, 2)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["subtotal"], 1000);
    assert_eq!(json["shipping_fee"], 100);
    assert_eq!(json["final_amount"], 1100);
    assert_eq!(json["status"], "Pending");
    assert_eq!(json["payment_status"], "Pending");
    assert_eq!(json["payment"]["gateway"], "COD");
    assert_eq!(json["payment"]["amount"], 1100);
    assert!(json["code"].as_str().unwrap().starts_with("ORD-"));
    assert!(json["invoice_number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(json["status_history"].as_array().unwrap().len(), 1);

    // Stock was reserved.
    assert_eq!(state.store.stock_of(product_id).await, Some(8));
}

#[tokio::test]
async fn test_place_order_requires_caller_identity() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 10, 500).await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        None,
        Some(order_body(product_id, 1)),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().contains("X-User-Id"));
}

#[tokio::test]
async fn test_insufficient_stock_is_a_conflict() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 1, 500).await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(UserId::new()),
        Some(order_body(product_id, 5)),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["category"], "conflict");
    assert!(json["error"].as_str().unwrap().contains("Insufficient stock"));
    assert_eq!(state.store.stock_of(product_id).await, Some(1));
    assert_eq!(state.store.order_count().await, 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (app, _) = setup();

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(UserId::new()),
        Some(order_body(ProductId::new(), 1)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["category"], "not_found");
}

#[tokio::test]
async fn test_empty_cart_is_a_validation_error() {
    let (app, _) = setup();

    let body = serde_json::json!({
        "products": [],
        "shipping_address": {
            "full_name": "Test Customer",
            "phone": "01700000000",
            "district": "Dhaka",
            "address_line": "House 1, Road 2",
            "postal_code": "1207"
        },
        "payment_method": "cash-on-delivery"
    });
    let (status, json) = send(&app, "POST", "/orders", Some(UserId::new()), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["category"], "validation");
}

#[tokio::test]
async fn test_get_order_by_id_and_code() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 10, 500).await;
    let user = UserId::new();

    let (_, created) = send(
        &app,
        "POST",
        "/orders",
        Some(user),
        Some(order_body(product_id, 1)),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    let code = created["code"].as_str().unwrap();

    let (status, by_id) = send(&app, "GET", &format!("/orders/{id}"), Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["id"], created["id"]);

    let (status, by_code) = send(&app, "GET", &format!("/orders/{code}"), Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_code["id"], created["id"]);

    let missing = uuid::Uuid::new_v4();
    let (status, json) = send(&app, "GET", &format!("/orders/{missing}"), Some(user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["category"], "not_found");
}

#[tokio::test]
async fn test_update_status_appends_history() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 10, 500).await;
    let user = UserId::new();

    let (_, created) = send(
        &app,
        "POST",
        "/orders",
        Some(user),
        Some(order_body(product_id, 1)),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/orders/{id}/status"),
        Some(user),
        Some(serde_json::json!({"order_status": "Processing"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Processing");
    assert_eq!(updated["status_history"].as_array().unwrap().len(), 2);
    assert_eq!(updated["status_history"][1]["changed_by"], user.to_string());
}

#[tokio::test]
async fn test_illegal_transition_is_a_conflict() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 10, 500).await;
    let user = UserId::new();

    let (_, created) = send(
        &app,
        "POST",
        "/orders",
        Some(user),
        Some(order_body(product_id, 1)),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    send(
        &app,
        "PATCH",
        &format!("/orders/{id}/status"),
        Some(user),
        Some(serde_json::json!({"order_status": "Cancelled"})),
    )
    .await;

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/orders/{id}/status"),
        Some(user),
        Some(serde_json::json!({"order_status": "Processing"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["category"], "conflict");
}

#[tokio::test]
async fn test_list_orders_with_pagination() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 20, 500).await;
    let user = UserId::new();

    for _ in 0..3 {
        send(
            &app,
            "POST",
            "/orders",
            Some(user),
            Some(order_body(product_id, 1)),
        )
        .await;
    }

    let (status, json) = send(
        &app,
        "GET",
        &format!("/orders?user={user}&page=1&limit=2"),
        Some(user),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["orders"].as_array().unwrap().len(), 2);
    assert_eq!(json["pagination"]["total_count"], 3);
    assert_eq!(json["pagination"]["total_pages"], 2);
    assert_eq!(json["pagination"]["has_next_page"], true);
}

#[tokio::test]
async fn test_statistics() {
    let (app, state) = setup();
    let product_id = seed_product(&state, 10, 500).await;
    let user = UserId::new();

    send(
        &app,
        "POST",
        "/orders",
        Some(user),
        Some(order_body(product_id, 2)),
    )
    .await;

    let (status, json) = send(&app, "GET", "/orders/statistics", Some(user), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["today"]["orders"], 1);
    assert_eq!(json["this_month"]["orders"], 1);
    // Payment still pending, so no sales yet.
    assert_eq!(json["today"]["sales"], 0);
    assert_eq!(json["status_counts"]["pending"], 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
