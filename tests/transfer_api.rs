//! Integration tests for the transfer HTTP API
//!
//! Drives the full router with an in-memory publisher:
//! - Accepted / rejected / failed submissions and their bodies
//! - What reaches the stream (key, payload, partition, offset)
//! - Health and OpenAPI endpoints

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use transfer_gateway::{
    EventPublisher, InMemoryPublisher, TransferRequest,
    gateway::{create_router, state::AppState},
};

// ============================================================================
// Test Fixtures
// ============================================================================

fn create_test_app() -> (Router, Arc<InMemoryPublisher>) {
    let publisher = Arc::new(InMemoryPublisher::new("transfer-requests", 3));
    let state = Arc::new(AppState::new(publisher.clone()));
    (create_router(state), publisher)
}

fn transfer_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/transfer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn scenario_a_body() -> Value {
    json!({
        "idempotency_key": "tx-1",
        "source_account": "A",
        "target_account": "B",
        "amount": 100.50,
        "currency": "USD"
    })
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_scenario_a_valid_transfer_accepted() {
    let (app, publisher) = create_test_app();

    let (status, body) = send(&app, transfer_request(&scenario_a_body())).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body,
        json!({"message": "Transfer initiated successfully", "status": "pending"})
    );

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key, "tx-1");

    // Event value carries exactly the five submitted fields
    let value: Value = serde_json::from_slice(&events[0].value).unwrap();
    assert_eq!(value, scenario_a_body());
}

#[tokio::test]
async fn test_scenario_b_zero_amount_rejected() {
    let (app, publisher) = create_test_app();
    let mut body = scenario_a_body();
    body["amount"] = json!(0);

    let (status, resp) = send(&app, transfer_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = resp["error"].as_str().unwrap();
    assert!(error.contains("amount"), "error should name amount: {}", error);
    assert_eq!(publisher.attempt_count(), 0);
}

#[tokio::test]
async fn test_scenario_c_short_currency_rejected() {
    let (app, publisher) = create_test_app();
    let mut body = scenario_a_body();
    body["currency"] = json!("US");

    let (status, resp) = send(&app, transfer_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].as_str().unwrap().contains("currency"));
    assert_eq!(publisher.attempt_count(), 0);
}

#[tokio::test]
async fn test_scenario_d_broker_failure_is_generic_500() {
    let (app, publisher) = create_test_app();
    publisher.set_fail_send(true);

    let (status, resp) = send(&app, transfer_request(&scenario_a_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({"error": "Failed to process request"}));
    assert_eq!(publisher.attempt_count(), 1);
    assert!(publisher.events().is_empty());
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (app, publisher) = create_test_app();
    let required = [
        "idempotency_key",
        "source_account",
        "target_account",
        "amount",
        "currency",
    ];

    for field in required {
        let mut body = scenario_a_body();
        body.as_object_mut().unwrap().remove(field);

        let (status, resp) = send(&app, transfer_request(&body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {}", field);
        assert!(resp["error"].as_str().unwrap().contains(field));
    }
    assert_eq!(publisher.attempt_count(), 0);
}

#[tokio::test]
async fn test_negative_amount_rejected() {
    let (app, publisher) = create_test_app();
    let mut body = scenario_a_body();
    body["amount"] = json!(-5);

    let (status, _) = send(&app, transfer_request(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(publisher.attempt_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (app, publisher) = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/transfer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"idempotency_key\": "))
        .unwrap();

    let (status, resp) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].as_str().unwrap().starts_with("Invalid JSON"));
    assert_eq!(publisher.attempt_count(), 0);
}

#[tokio::test]
async fn test_wrong_field_type_rejected() {
    let (app, _) = create_test_app();
    let mut body = scenario_a_body();
    body["source_account"] = json!(42);

    let (status, _) = send(&app, transfer_request(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Stream properties
// ============================================================================

#[tokio::test]
async fn test_published_key_and_payload_match_request() {
    let (app, publisher) = create_test_app();

    for i in 0..10 {
        let body = json!({
            "idempotency_key": format!("key-{}", i),
            "source_account": format!("src-{}", i),
            "target_account": "dst",
            "amount": 1 + i,
            "currency": "EUR"
        });
        let (status, _) = send(&app, transfer_request(&body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    for event in publisher.events() {
        let payload: TransferRequest = event.payload().unwrap();
        assert_eq!(event.key, payload.idempotency_key);
    }
}

#[tokio::test]
async fn test_same_key_keeps_send_order() {
    let (app, publisher) = create_test_app();

    for amount in [1, 2, 3, 4] {
        let mut body = scenario_a_body();
        body["idempotency_key"] = json!("tx-ordered");
        body["amount"] = json!(amount);
        let (status, _) = send(&app, transfer_request(&body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        // Interleave another key
        let mut other = scenario_a_body();
        other["idempotency_key"] = json!(format!("tx-other-{}", amount));
        send(&app, transfer_request(&other)).await;
    }

    let events = publisher.events_for_key("tx-ordered");
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.partition == events[0].partition));
    assert!(events.windows(2).all(|w| w[0].offset < w[1].offset));

    let amounts: Vec<Decimal> = events
        .iter()
        .map(|e| e.payload().unwrap().amount)
        .collect();
    assert_eq!(amounts, [1, 2, 3, 4].map(Decimal::from).to_vec());
}

// ============================================================================
// System endpoints
// ============================================================================

#[tokio::test]
async fn test_health_reflects_publisher_state() {
    let (app, publisher) = create_test_app();
    let health = || {
        Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = send(&app, health()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "topic": "transfer-requests"}));

    publisher.close().await.unwrap();

    let (status, body) = send(&app, health()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");

    // Closed publisher: submissions fail as server errors
    let (status, _) = send(&app, transfer_request(&scenario_a_body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _) = create_test_app();
    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/transfer"].is_object());
}
