//! outreach - Marketing campaign backend
//!
//! Customers, orders, audience batches with best-effort fan-out delivery,
//! per-customer delivery status tracking and campaign read views.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core documents and types
//! - [`storage`] - Document store trait with in-memory and SQLite backends
//! - [`customers`] - Customer and order creation, customer filtering
//! - [`delivery`] - Audience fan-out, status tracking and aggregation
//! - [`campaign`] - Campaigns and the campaign read view
//! - [`server`] - REST API, server wiring and the status callback client
//! - [`metrics`] - Prometheus metrics
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use outreach::config::Config;
//! use outreach::server::AppServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = AppServer::new(&config)?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod campaign;
pub mod config;
pub mod customers;
pub mod delivery;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::campaign::{CampaignService, CampaignView};
    pub use crate::config::Config;
    pub use crate::customers::CustomerService;
    pub use crate::delivery::{AudienceSummary, DeliveryService, DispatchReport};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        BatchId, Campaign, CampaignId, CommunicationBatch, Customer, CustomerId, DeliveryOutcome,
        DeliveryRecord, DeliveryStatus, Order,
    };
    pub use crate::storage::{DocumentStore, SharedStore};
}

// Direct re-exports for convenience
pub use models::{CommunicationBatch, DeliveryRecord, DeliveryStatus};
