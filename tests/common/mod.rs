//! Common test utilities

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use outreach::config::Config;
use outreach::delivery::AudienceSummary;
use outreach::models::{BatchId, Customer};
use outreach::server::AppServer;
use outreach::storage::{DocumentStore, MemoryStore, SharedStore};

/// Config with deterministic, always-successful delivery
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.delivery.success_rate = 1.0;
    config.delivery.seed = Some(7);
    config.server.enable_request_logging = false;
    config
}

/// Router over a fresh in-memory store
#[allow(dead_code)]
pub fn test_app(config: &Config) -> (Router, SharedStore) {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let server = AppServer::with_store(config, store.clone()).unwrap();
    (server.build_router(), store)
}

/// Create a customer with a given name directly in the store
#[allow(dead_code)]
pub async fn seed_customer(store: &SharedStore, name: &str) -> Customer {
    let customer = Customer::new(
        name,
        format!("{}@example.com", name.to_lowercase()),
        "secret1",
    );
    store.save_customer(&customer).await.unwrap();
    customer
}

/// Send a request through the router and decode the JSON response
#[allow(dead_code)]
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(json) => request.body(Body::from(json.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

/// Poll a batch until no record is pending
#[allow(dead_code)]
pub async fn wait_for_delivery(store: &SharedStore, batch: &BatchId) -> AudienceSummary {
    let mut summary = AudienceSummary::default();
    for _ in 0..200 {
        let stored = store.find_batch(batch).await.unwrap().unwrap();
        summary = AudienceSummary::from_records(&stored.records);
        if summary.is_complete() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    summary
}
