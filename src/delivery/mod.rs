//! Audience delivery
//!
//! Turns a list of customers into a communication batch, fans the batch out
//! to one delivery attempt per customer and tracks each outcome.
//!
//! # Architecture
//!
//! ```text
//!  save_audience ──► CommunicationBatch (all PENDING)
//!                             │
//!                             ▼  (background task)
//!                    ┌─────────────────┐
//!                    │   Dispatcher    │  one task per record
//!                    └─────────────────┘
//!                       │           │
//!                       ▼           ▼
//!                 ┌──────────┐ ┌────────────────┐
//!                 │Transport │ │ StatusReporter │ in-process or HTTP
//!                 └──────────┘ └────────────────┘
//!                                      │
//!                                      ▼
//!                             ┌─────────────────┐
//!                             │  StatusTracker  │ per-record update
//!                             └─────────────────┘
//! ```
//!
//! [`AudienceAggregator`] reads the batch back and counts statuses.

pub mod aggregator;
pub mod dispatcher;
pub mod reporter;
pub mod tracker;
pub mod transport;

use std::sync::Arc;

use crate::config::{Config, ReporterKind};
use crate::error::{Error, Result};
use crate::models::{CommunicationBatch, CustomerId, DeliveryRecord};
use crate::server::client::{ClientConfig, StatusClient};
use crate::storage::SharedStore;

pub use aggregator::{AudienceAggregator, AudienceSummary};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use reporter::{HttpStatusReporter, StatusReporter, TrackerReporter};
pub use tracker::{StatusChange, StatusTracker};
pub use transport::{SimulatedTransport, Transport, DEFAULT_SUCCESS_RATE};

/// Entry point for creating and delivering audiences
#[derive(Clone)]
pub struct DeliveryService {
    store: SharedStore,
    dispatcher: Dispatcher,
    tracker: StatusTracker,
    aggregator: AudienceAggregator,
}

impl DeliveryService {
    /// Assemble a service from explicit parts
    pub fn new(
        store: SharedStore,
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(store.clone(), transport, reporter),
            tracker: StatusTracker::new(store.clone()),
            aggregator: AudienceAggregator::new(store.clone()),
            store,
        }
    }

    /// Build the transport and reporter selected by configuration
    pub fn from_config(store: SharedStore, config: &Config) -> Result<Self> {
        let delivery = &config.delivery;
        let transport: Arc<dyn Transport> = Arc::new(match delivery.seed {
            Some(seed) => SimulatedTransport::with_seed(delivery.success_rate, seed),
            None => SimulatedTransport::new(delivery.success_rate),
        });

        let reporter: Arc<dyn StatusReporter> = match delivery.reporter {
            ReporterKind::InProcess => {
                Arc::new(TrackerReporter::new(StatusTracker::new(store.clone())))
            }
            ReporterKind::Http => {
                let client = StatusClient::new(ClientConfig {
                    base_url: config.callback_url(),
                    timeout_secs: delivery.request_timeout_secs,
                })?;
                Arc::new(HttpStatusReporter::new(client))
            }
        };

        tracing::info!(
            success_rate = delivery.success_rate,
            seeded = delivery.seed.is_some(),
            reporter = reporter.name(),
            "Delivery service configured"
        );

        Ok(Self::new(store, transport, reporter))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    pub fn aggregator(&self) -> &AudienceAggregator {
        &self.aggregator
    }

    /// Persist a batch for the given customers without delivering it
    ///
    /// Malformed and unknown IDs are skipped. Every record starts `PENDING`
    /// with the audience promotion addressed to the customer by name.
    pub async fn create_batch(&self, customer_ids: &[String]) -> Result<CommunicationBatch> {
        if customer_ids.is_empty() {
            return Err(Error::bad_request("Invalid request body"));
        }

        let ids: Vec<CustomerId> = customer_ids
            .iter()
            .filter_map(|raw| {
                let id = CustomerId::parse(raw);
                if id.is_none() {
                    tracing::debug!(id = %raw, "Skipping malformed customer ID");
                }
                id
            })
            .collect();

        let customers = self.store.find_customers(&ids).await?;
        let batch = CommunicationBatch::new(
            customers.iter().map(DeliveryRecord::for_customer).collect(),
        );
        self.store.save_batch(&batch).await?;

        tracing::info!(
            batch_id = %batch.id,
            requested = customer_ids.len(),
            records = batch.records.len(),
            "Audience saved"
        );

        Ok(batch)
    }

    /// Persist a batch and start delivering it in the background
    ///
    /// Returns as soon as the batch is stored; delivery outcomes arrive later.
    pub async fn save_audience(&self, customer_ids: &[String]) -> Result<CommunicationBatch> {
        let batch = self.create_batch(customer_ids).await?;
        self.dispatcher.spawn(batch.id.clone());
        Ok(batch)
    }
}
