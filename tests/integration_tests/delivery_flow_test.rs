//! Audience delivery flow tests
//!
//! save audience -> background fan-out -> status reports -> campaign view,
//! with both the in-process reporter and the HTTP status callback.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use outreach::config::ReporterKind;
use outreach::delivery::{DeliveryService, StatusTracker, TrackerReporter};
use outreach::models::{BatchId, DeliveryStatus};
use outreach::server::AppServer;
use outreach::storage::{DocumentStore, MemoryStore, SharedStore};

use crate::common::{seed_customer, send, test_app, test_config, wait_for_delivery};

#[tokio::test]
async fn test_audience_to_campaign_view() {
    let mut config = test_config();
    config.delivery.success_rate = 0.0;
    let (app, store) = test_app(&config);

    let mut ids = Vec::new();
    for name in ["Ann", "Ben", "Cid"] {
        ids.push(seed_customer(&store, name).await.id.to_string());
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/save-audience",
        Some(json!({ "customers": ids })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let batch_id = BatchId::new(body["data"]["id"].as_str().unwrap());

    let summary = wait_for_delivery(&store, &batch_id).await;
    assert_eq!(summary.size, 3);
    assert_eq!(summary.failed, 3);

    let (status, body) = send(
        &app,
        Method::POST,
        "/campaigns",
        Some(json!({"name": "Spring", "description": "10% off", "audience": batch_id.as_str()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let campaign_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/campaign/{campaign_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let view = &body["data"];
    assert_eq!(view["campaign"]["name"], "Spring");
    assert_eq!(view["audienceSize"], 3);
    assert_eq!(view["sentDetails"], 0);
    assert_eq!(view["failedDetails"], 3);
    assert_eq!(view["audience"]["customers"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_counts_always_partition_the_batch() {
    let mut config = test_config();
    config.delivery.success_rate = 0.5;
    let (app, store) = test_app(&config);

    let mut ids = Vec::new();
    for i in 0..40 {
        ids.push(seed_customer(&store, &format!("Customer{i}")).await.id.to_string());
    }

    let (_, body) = send(
        &app,
        Method::POST,
        "/save-audience",
        Some(json!({ "customers": ids })),
    )
    .await;
    let batch_id = BatchId::new(body["data"]["id"].as_str().unwrap());

    let summary = wait_for_delivery(&store, &batch_id).await;
    assert_eq!(summary.size, 40);
    assert_eq!(summary.sent + summary.failed + summary.pending, summary.size);
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_duplicate_customer_updates_first_record_only() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let customer = seed_customer(&store, "Dup").await;
    let service = DeliveryService::new(
        store.clone(),
        Arc::new(outreach::delivery::SimulatedTransport::new(1.0)),
        Arc::new(TrackerReporter::new(StatusTracker::new(store.clone()))),
    );

    let id = customer.id.to_string();
    let batch = service.create_batch(&[id.clone(), id]).await.unwrap();
    let report = service.dispatcher().dispatch(&batch.id).await.unwrap();
    assert_eq!(report.attempted, 2);

    let stored = store.find_batch(&batch.id).await.unwrap().unwrap();
    assert_eq!(stored.records[0].status, DeliveryStatus::Sent);
    assert_eq!(stored.records[1].status, DeliveryStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_http_status_callback_round_trip() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = test_config();
    config.delivery.reporter = ReporterKind::Http;
    config.delivery.callback_url = Some(format!("http://{addr}"));

    let store: SharedStore = Arc::new(MemoryStore::new());
    let server = AppServer::with_store(&config, store.clone()).unwrap();
    let router = server.build_router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let mut ids = Vec::new();
    for name in ["Eve", "Fay"] {
        ids.push(seed_customer(&store, name).await.id.to_string());
    }

    let batch = server
        .state()
        .delivery
        .save_audience(&ids)
        .await
        .unwrap();

    let summary = wait_for_delivery(&store, &batch.id).await;
    assert_eq!(summary.size, 2);
    assert_eq!(summary.sent, 2);
}

#[tokio::test]
async fn test_unreachable_callback_leaves_records_pending() {
    let mut config = test_config();
    config.delivery.reporter = ReporterKind::Http;
    // Nothing listens on the discard port.
    config.delivery.callback_url = Some("http://127.0.0.1:9".to_string());
    config.delivery.request_timeout_secs = 1;

    let store: SharedStore = Arc::new(MemoryStore::new());
    let server = AppServer::with_store(&config, store.clone()).unwrap();
    let customer = seed_customer(&store, "Gus").await;

    let delivery = server.state().delivery;
    let batch = delivery
        .create_batch(&[customer.id.to_string()])
        .await
        .unwrap();
    let report = delivery.dispatcher().dispatch(&batch.id).await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.unreported, 1);
    let stored = store.find_batch(&batch.id).await.unwrap().unwrap();
    assert_eq!(stored.records[0].status, DeliveryStatus::Pending);
}
