//! Fan-out dispatcher
//!
//! Delivers every record of a communication batch concurrently, one tokio
//! task per customer, and reports each outcome through a [`StatusReporter`].
//!
//! Delivery is best effort:
//! - a missing batch aborts the whole dispatch with a single error
//! - a failed status report is logged and dropped, leaving that record `PENDING`
//! - nothing is retried
//!
//! # Usage
//!
//! ```ignore
//! use outreach::delivery::Dispatcher;
//!
//! let dispatcher = Dispatcher::new(store, transport, reporter);
//! // Fire and forget from a request handler:
//! dispatcher.spawn(batch.id.clone());
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};

use super::reporter::StatusReporter;
use super::transport::Transport;
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::{BatchId, DeliveryOutcome};
use crate::storage::SharedStore;

/// What happened to one record during dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// Outcome reached the status tracker
    Reported(DeliveryOutcome),
    /// Outcome was produced but could not be reported
    Unreported(DeliveryOutcome),
}

/// Result of dispatching one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub batch_id: BatchId,
    /// Delivery attempts started (one per record)
    pub attempted: usize,
    /// Attempts the transport reported as sent
    pub sent: usize,
    /// Attempts the transport reported as failed
    pub failed: usize,
    /// Attempts whose outcome never reached the status tracker
    pub unreported: usize,
}

impl DispatchReport {
    fn new(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            attempted: 0,
            sent: 0,
            failed: 0,
            unreported: 0,
        }
    }

    fn count_outcome(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Sent => self.sent += 1,
            DeliveryOutcome::Failed => self.failed += 1,
        }
    }

    fn record(&mut self, attempt: Attempt) {
        self.attempted += 1;
        match attempt {
            Attempt::Reported(outcome) => self.count_outcome(outcome),
            Attempt::Unreported(outcome) => {
                self.count_outcome(outcome);
                self.unreported += 1;
            }
        }
    }

    /// Records whose status was updated by this dispatch
    pub fn reported(&self) -> usize {
        self.attempted - self.unreported
    }
}

/// Concurrent per-customer delivery for communication batches
#[derive(Clone)]
pub struct Dispatcher {
    store: SharedStore,
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn StatusReporter>,
}

impl Dispatcher {
    pub fn new(
        store: SharedStore,
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            store,
            transport,
            reporter,
        }
    }

    /// Name of the configured status reporter
    pub fn reporter_name(&self) -> &str {
        self.reporter.name()
    }

    /// Deliver every record of a batch and wait for all attempts
    pub async fn dispatch(&self, batch_id: &BatchId) -> Result<DispatchReport> {
        let _timer = metrics::start_dispatch_timer(self.reporter.name());

        let batch = match self.store.find_batch(batch_id).await? {
            Some(batch) => batch,
            None => {
                metrics::record_dispatch("aborted");
                return Err(Error::not_found("Communication", batch_id));
            }
        };

        tracing::info!(
            batch_id = %batch_id,
            records = batch.records.len(),
            transport = self.transport.name(),
            reporter = self.reporter.name(),
            "Dispatching communication batch"
        );

        let mut attempts = JoinSet::new();
        for record in batch.records {
            let transport = Arc::clone(&self.transport);
            let reporter = Arc::clone(&self.reporter);
            let batch_id = batch_id.clone();

            attempts.spawn(async move {
                let outcome = transport.deliver(&record).await;
                metrics::record_delivery_attempt(outcome.as_str());

                match reporter.report(&batch_id, &record.customer, outcome).await {
                    Ok(()) => Attempt::Reported(outcome),
                    Err(e) => {
                        tracing::warn!(
                            batch_id = %batch_id,
                            customer_id = %record.customer,
                            %outcome,
                            error = %e,
                            "Failed to report delivery status, record stays pending"
                        );
                        metrics::record_report_failure();
                        Attempt::Unreported(outcome)
                    }
                }
            });
        }

        let mut report = DispatchReport::new(batch_id.clone());
        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok(attempt) => report.record(attempt),
                Err(e) => {
                    tracing::error!(batch_id = %batch_id, error = %e, "Delivery attempt task failed");
                    metrics::record_report_failure();
                    report.attempted += 1;
                    report.unreported += 1;
                }
            }
        }

        metrics::record_dispatch("completed");
        tracing::info!(
            batch_id = %batch_id,
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            unreported = report.unreported,
            "Dispatch finished"
        );

        Ok(report)
    }

    /// Run [`Dispatcher::dispatch`] as a background task
    ///
    /// The caller does not wait for delivery; a failed dispatch is only logged.
    pub fn spawn(&self, batch_id: BatchId) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.dispatch(&batch_id).await {
                tracing::error!(batch_id = %batch_id, error = %e, "Failed to send messages");
            }
        })
    }
}
