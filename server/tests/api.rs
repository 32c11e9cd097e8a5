//! API tests driven through the router with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use registration_core::{
    CachedCatalog, CatalogConfig, InMemoryPaymentLedger, InMemoryRegistrationStore,
    ReconciliationCoordinator, SandboxGateway,
};
use registration_server::state::AppState;

/// Sample catalog with its windows re-anchored around the current
/// instant, so requests priced at "now" always land in early bird
/// regardless of the wall-clock date.
fn test_catalog() -> CatalogConfig {
    let mut config = CatalogConfig::sample();
    let day = |offset: i64| chrono::Utc::now() + chrono::Duration::days(offset);
    let windows = [(-30, 30), (30, 60), (60, 90)];
    for (period, (start, end)) in config.pricing_periods.iter_mut().zip(windows) {
        period.start_date = day(start);
        period.end_date = day(end);
    }
    config
}

fn test_app() -> Router {
    let coordinator = ReconciliationCoordinator::new(
        Arc::new(InMemoryRegistrationStore::new()),
        Arc::new(InMemoryPaymentLedger::new()),
    )
    .with_gateway(Arc::new(SandboxGateway::new()));

    let catalog = CachedCatalog::new(
        Box::new(|| test_catalog().build()),
        Duration::from_secs(300),
    );

    registration_server::app(AppState {
        coordinator: Arc::new(coordinator),
        catalog: Arc::new(catalog),
    })
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn draft_body() -> Value {
    json!({
        "type": "regular",
        "typeId": "speaker",
        "currency": "USD",
        "participantCount": 2,
        "customerEmail": "attendee@example.com",
        "customerName": "Jordan Ray"
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_full_draft_order_confirm_flow() {
    let app = test_app();

    let (status, draft) = post_json(&app, "/registration", draft_body()).await;
    assert_eq!(status, StatusCode::CREATED, "draft failed: {draft}");
    let registration_id = draft["registrationId"].as_str().unwrap().to_string();
    assert!(registration_id.starts_with("TEMP-REG-"));
    // Speaker early bird is priced per head; amounts are minor units.
    assert_eq!(draft["pricing"]["totalPrice"], json!(59800));
    assert_eq!(draft["paymentStatus"], "pending");

    // Order bodies carry major-unit decimals.
    let amount = draft["pricing"]["totalPrice"].as_i64().unwrap() as f64 / 100.0;
    let (status, order) = post_json(
        &app,
        "/registration/order",
        json!({
            "amount": amount,
            "currency": "USD",
            "registrationId": registration_id,
            "customerEmail": "attendee@example.com",
            "paymentMethod": "test"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "order failed: {order}");
    let order_id = order["orderId"].as_str().unwrap().to_string();
    assert_eq!(order["registrationId"], json!(registration_id));
    assert_eq!(order["status"], "created");

    let (status, confirmed) = post_json(
        &app,
        "/registration/confirm",
        json!({
            "gatewayOrderId": order_id,
            "transactionId": "txn_001",
            "status": "completed"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "confirm failed: {confirmed}");
    assert_eq!(confirmed["paymentStatus"], "completed");

    let (status, fetched) = get(&app, &format!("/registration/{registration_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["paymentStatus"], "completed");
    assert_eq!(fetched["gatewayTransactionId"], "txn_001");
}

#[tokio::test]
async fn test_confirm_is_idempotent_and_conflicts_are_409() {
    let app = test_app();

    let (_, draft) = post_json(&app, "/registration", draft_body()).await;
    let registration_id = draft["registrationId"].as_str().unwrap();
    let amount = draft["pricing"]["totalPrice"].as_i64().unwrap() as f64 / 100.0;
    let (_, order) = post_json(
        &app,
        "/registration/order",
        json!({
            "amount": amount,
            "currency": "USD",
            "registrationId": registration_id,
            "customerEmail": "attendee@example.com",
            "paymentMethod": "test"
        }),
    )
    .await;
    let order_id = order["orderId"].as_str().unwrap();

    let confirm = |txn: &str| {
        json!({
            "gatewayOrderId": order_id,
            "transactionId": txn,
            "status": "completed"
        })
    };

    let (status, _) = post_json(&app, "/registration/confirm", confirm("txn_001")).await;
    assert_eq!(status, StatusCode::OK);

    // Same transaction again: no-op success.
    let (status, _) = post_json(&app, "/registration/confirm", confirm("txn_001")).await;
    assert_eq!(status, StatusCode::OK);

    // Different transaction: conflict, original record untouched.
    let (status, body) = post_json(&app, "/registration/confirm", confirm("txn_002")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PAYMENT_STATE_CONFLICT");
}

#[tokio::test]
async fn test_amount_mismatch_is_409() {
    let app = test_app();

    let (_, draft) = post_json(&app, "/registration", draft_body()).await;
    let registration_id = draft["registrationId"].as_str().unwrap();

    let (status, body) = post_json(
        &app,
        "/registration/order",
        json!({
            "amount": 1.0,
            "currency": "USD",
            "registrationId": registration_id,
            "customerEmail": "attendee@example.com",
            "paymentMethod": "test"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "AMOUNT_MISMATCH");
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let app = test_app();

    // Unknown currency.
    let mut body = draft_body();
    body["currency"] = json!("AUD");
    let (status, err) = post_json(&app, "/registration", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "UNSUPPORTED_CURRENCY");

    // Regular type without a typeId.
    let mut body = draft_body();
    body.as_object_mut().unwrap().remove("typeId");
    let (status, _) = post_json(&app, "/registration", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Order for an unknown payment method.
    let (status, err) = post_json(
        &app,
        "/registration/order",
        json!({
            "amount": 10.0,
            "currency": "USD",
            "customerEmail": "a@b.c",
            "paymentMethod": "stripe"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "UNSUPPORTED_PAYMENT_METHOD");
}

#[tokio::test]
async fn test_unknown_registration_is_404() {
    let app = test_app();
    let (status, _) = get(&app, "/registration/TEMP-REG-does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_sponsor_tier_rejected() {
    let app = test_app();
    let (status, _) = post_json(
        &app,
        "/registration",
        json!({
            "type": "sponsorship",
            "sponsorTier": "diamond",
            "currency": "USD",
            "customerEmail": "sponsor@example.com"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
