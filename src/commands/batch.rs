use anyhow::{Context, Result};

use outreach::config::{Config, StorageBackend};
use outreach::delivery::DeliveryService;
use outreach::models::BatchId;
use outreach::storage::{self, SharedStore};

/// Open the persistent store; the in-memory store would always be empty here
fn open_sqlite(config: &Config) -> Result<SharedStore> {
    let mut storage_config = config.storage.clone();
    storage_config.backend = StorageBackend::Sqlite;

    storage::open(&storage_config).with_context(|| {
        format!(
            "Failed to open SQLite store at {}",
            storage_config.sqlite_path.display()
        )
    })
}

/// Print delivery counts for a batch
pub async fn summary(config: Config, batch: String) -> Result<()> {
    let store = open_sqlite(&config)?;
    let service = DeliveryService::from_config(store, &config)?;

    let summary = service.aggregator().summarize(&BatchId::new(batch)).await?;
    println!("{}", summary.display());
    Ok(())
}

/// Deliver a batch in the foreground and print the report
pub async fn dispatch(config: Config, batch: String) -> Result<()> {
    let store = open_sqlite(&config)?;
    let service = DeliveryService::from_config(store, &config)?;
    let batch_id = BatchId::new(batch);

    let report = service.dispatcher().dispatch(&batch_id).await?;
    println!("Dispatch Report");
    println!("{:-<30}", "");
    println!("Batch: {}", report.batch_id);
    println!("Attempted: {}", report.attempted);
    println!("- Sent: {}", report.sent);
    println!("- Failed: {}", report.failed);
    println!("Unreported: {}", report.unreported);

    let summary = service.aggregator().summarize(&batch_id).await?;
    println!();
    println!("{}", summary.display());
    Ok(())
}
