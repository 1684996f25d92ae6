//! SQLite store integration tests
//!
//! Uses temporary database files to check persistence across reopen and
//! per-record status updates under concurrency.

use std::sync::Arc;

use futures::future::join_all;
use tempfile::TempDir;

use outreach::config::{StorageBackend, StorageConfig};
use outreach::delivery::{AudienceAggregator, DeliveryService, SimulatedTransport, StatusTracker, TrackerReporter};
use outreach::models::{
    Campaign, CommunicationBatch, Customer, CustomerId, DeliveryOutcome, DeliveryRecord,
    DeliveryStatus,
};
use outreach::storage::{self, DocumentStore, SharedStore, SqliteStore};

fn sqlite_config(dir: &TempDir) -> StorageConfig {
    StorageConfig {
        backend: StorageBackend::Sqlite,
        sqlite_path: dir.path().join("nested").join("outreach.db"),
    }
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config(&dir);

    let customer = Customer::new("Ada", "ada@example.com", "secret1");
    let batch = CommunicationBatch::new(vec![DeliveryRecord::for_customer(&customer)]);
    let campaign = Campaign::new("Launch", "First campaign", batch.id.clone());

    {
        let store = storage::open(&config).unwrap();
        store.save_customer(&customer).await.unwrap();
        store.save_batch(&batch).await.unwrap();
        store.save_campaign(&campaign).await.unwrap();
        store
            .update_delivery_status(&batch.id, &customer.id, DeliveryStatus::Sent)
            .await
            .unwrap();
    }

    let store = storage::open(&config).unwrap();
    assert_eq!(
        store.find_customer(&customer.id).await.unwrap().unwrap().email,
        "ada@example.com"
    );
    assert_eq!(
        store.find_campaign(&campaign.id).await.unwrap().unwrap().audience,
        Some(batch.id.clone())
    );

    let stored = store.find_batch(&batch.id).await.unwrap().unwrap();
    assert_eq!(stored.records[0].status, DeliveryStatus::Sent);
    assert_eq!(
        stored.records[0].message,
        "Hi Ada, here is 10% off on your next order"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reports_are_all_kept() {
    let dir = TempDir::new().unwrap();
    let store: SharedStore = Arc::new(SqliteStore::new(dir.path().join("race.db")).unwrap());

    let customers: Vec<CustomerId> = (0..30).map(|_| CustomerId::generate()).collect();
    let batch = CommunicationBatch::new(
        customers
            .iter()
            .map(|c| DeliveryRecord::new(c.clone(), "hi"))
            .collect(),
    );
    store.save_batch(&batch).await.unwrap();

    let tracker = StatusTracker::new(store.clone());
    let reports = customers.iter().enumerate().map(|(i, customer)| {
        let tracker = tracker.clone();
        let batch_id = batch.id.clone();
        let customer = customer.clone();
        tokio::spawn(async move {
            let outcome = if i % 3 == 0 {
                DeliveryOutcome::Failed
            } else {
                DeliveryOutcome::Sent
            };
            tracker.record_status(&batch_id, &customer, outcome).await
        })
    });

    for joined in join_all(reports).await {
        joined.unwrap().unwrap();
    }

    let summary = AudienceAggregator::new(store.clone())
        .summarize(&batch.id)
        .await
        .unwrap();
    assert_eq!(summary.size, 30);
    assert_eq!(summary.failed, 10);
    assert_eq!(summary.sent, 20);
    assert_eq!(summary.pending, 0);
}

#[tokio::test]
async fn test_dispatch_against_sqlite() {
    let dir = TempDir::new().unwrap();
    let store = storage::open(&sqlite_config(&dir)).unwrap();

    let mut ids = Vec::new();
    for name in ["Ivy", "Jon", "Kim"] {
        let customer = Customer::new(name, format!("{name}@example.com"), "secret1");
        store.save_customer(&customer).await.unwrap();
        ids.push(customer.id.to_string());
    }

    let service = DeliveryService::new(
        store.clone(),
        Arc::new(SimulatedTransport::with_seed(1.0, 11)),
        Arc::new(TrackerReporter::new(StatusTracker::new(store.clone()))),
    );
    let batch = service.create_batch(&ids).await.unwrap();
    let report = service.dispatcher().dispatch(&batch.id).await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.sent, 3);

    let summary = service.aggregator().summarize(&batch.id).await.unwrap();
    assert_eq!(summary.sent, 3);
    assert!(summary.is_complete());
}
