//! REST API integration tests
//!
//! Requests go through the full router (no network) with an in-memory store.

use axum::http::{Method, StatusCode};
use serde_json::json;

use outreach::models::{BatchId, CommunicationBatch, CustomerId, DeliveryRecord, DeliveryStatus};
use outreach::storage::DocumentStore;

use crate::common::{seed_customer, send, test_app, test_config};

// ============================================================================
// Customers & Orders
// ============================================================================

#[tokio::test]
async fn test_create_customer() {
    let (app, _store) = test_app(&test_config());

    let (status, body) = send(
        &app,
        Method::POST,
        "/customers",
        Some(json!({"name": " Alice ", "email": "alice@example.com", "password": "secret1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Alice");
    assert_eq!(body["data"]["totalVisits"], 0);
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_create_customer_validation_error() {
    let (app, store) = test_app(&test_config());

    let (status, body) = send(
        &app,
        Method::POST,
        "/customers",
        Some(json!({"name": "Alice", "email": "nope", "password": "secret1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "\"email\" must be a valid email");
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(store.list_customers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _store) = test_app(&test_config());

    let (status, body) = send(&app, Method::POST, "/customers", Some(json!("not an object"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn test_create_order_updates_customer() {
    let (app, store) = test_app(&test_config());
    let customer = seed_customer(&store, "Bob").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({
            "customer": customer.id.as_str(),
            "product": "Coffee",
            "quantity": 3,
            "price": 2.5
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customer"], customer.id.as_str());
    assert_eq!(body["data"]["quantity"], 3);

    let stored = store.find_customer(&customer.id).await.unwrap().unwrap();
    assert!((stored.total_spend - 7.5).abs() < 1e-9);
    assert_eq!(stored.total_visits, 1);
}

#[tokio::test]
async fn test_create_order_errors() {
    let (app, _store) = test_app(&test_config());

    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({"customer": "123", "product": "Tea", "quantity": 1, "price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid customer ID.");

    let (status, _) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({
            "customer": CustomerId::generate().as_str(),
            "product": "Tea",
            "quantity": 1,
            "price": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({"customer": "x", "product": "Tea", "quantity": 0, "price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "\"quantity\" must be greater than or equal to 1");
}

#[tokio::test]
async fn test_filtered_customers() {
    let (app, store) = test_app(&test_config());
    let mut rich = seed_customer(&store, "Rich").await;
    rich.record_purchase(500.0, 1);
    store.save_customer(&rich).await.unwrap();
    seed_customer(&store, "Poor").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/get-filtered-customers?minSpend=100",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let customers = body["data"].as_array().unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["name"], "Rich");

    let (status, body) = send(&app, Method::GET, "/get-filtered-customers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::GET,
        "/get-filtered-customers?minSpend=lots",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Audience & Status
// ============================================================================

#[tokio::test]
async fn test_save_audience_rejects_empty_list() {
    let (app, _store) = test_app(&test_config());

    for body in [json!({"customers": []}), json!({}), json!({"customers": "abc"})] {
        let (status, response) = send(&app, Method::POST, "/save-audience", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "Invalid request body");
    }
}

#[tokio::test]
async fn test_save_audience_returns_created_batch() {
    let (app, store) = test_app(&test_config());
    let alice = seed_customer(&store, "Alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/save-audience",
        Some(json!({"customers": [alice.id.as_str(), CustomerId::generate().as_str()]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let records = body["data"]["customers"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["customer"], alice.id.as_str());
    assert_eq!(
        records[0]["message"],
        "Hi Alice, here is 10% off on your next order"
    );
}

#[tokio::test]
async fn test_update_status_errors() {
    let (app, store) = test_app(&test_config());
    let customer = CustomerId::generate();
    let batch = CommunicationBatch::new(vec![DeliveryRecord::new(customer.clone(), "hi")]);
    store.save_batch(&batch).await.unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/update-status",
        Some(json!({"communicationId": batch.id.as_str(), "status": "SENT"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");

    let (status, _) = send(
        &app,
        Method::POST,
        "/update-status",
        Some(json!({
            "communicationId": batch.id.as_str(),
            "customerId": customer.as_str(),
            "status": "PENDING"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/update-status",
        Some(json!({
            "communicationId": BatchId::generate().as_str(),
            "customerId": customer.as_str(),
            "status": "SENT"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/update-status",
        Some(json!({
            "communicationId": batch.id.as_str(),
            "customerId": CustomerId::generate().as_str(),
            "status": "SENT"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    // No update reached the record.
    let stored = store.find_batch(&batch.id).await.unwrap().unwrap();
    assert_eq!(stored.records[0].status, DeliveryStatus::Pending);
}

#[tokio::test]
async fn test_update_status_applies_outcome() {
    let (app, store) = test_app(&test_config());
    let customer = CustomerId::generate();
    let batch = CommunicationBatch::new(vec![DeliveryRecord::new(customer.clone(), "hi")]);
    store.save_batch(&batch).await.unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/update-status",
        Some(json!({
            "communicationId": batch.id.as_str(),
            "customerId": customer.as_str(),
            "status": "failed"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Status updated successfully");

    let stored = store.find_batch(&batch.id).await.unwrap().unwrap();
    assert_eq!(stored.records[0].status, DeliveryStatus::Failed);
}

// ============================================================================
// Campaigns
// ============================================================================

#[tokio::test]
async fn test_campaign_with_dangling_audience() {
    let (app, _store) = test_app(&test_config());

    let (status, body) = send(
        &app,
        Method::POST,
        "/campaigns",
        Some(json!({
            "name": "Ghost",
            "description": "No audience",
            "audience": BatchId::generate().as_str()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/campaign/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_campaign_without_audience() {
    let (app, _store) = test_app(&test_config());

    let (status, body) = send(
        &app,
        Method::POST,
        "/campaigns",
        Some(json!({"name": "NoAudience", "description": "d"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "NoAudience");
    assert!(body["data"].get("audience").is_none());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/campaign/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_campaign() {
    let (app, _store) = test_app(&test_config());
    let (status, _) = send(&app, Method::GET, "/campaign/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_campaigns_newest_first() {
    let (app, _store) = test_app(&test_config());

    for name in ["first", "second", "third"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/campaigns",
            Some(json!({"name": name, "description": "", "audience": BatchId::generate().as_str()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, body) = send(&app, Method::GET, "/campaigns", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

// ============================================================================
// Health & Metrics
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _store) = test_app(&test_config());
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    outreach::metrics::init_metrics().unwrap();
    let (app, _store) = test_app(&test_config());

    send(&app, Method::GET, "/api/health", None).await;
    let (status, body) = send(&app, Method::GET, "/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("outreach_api_requests_total"));
}
