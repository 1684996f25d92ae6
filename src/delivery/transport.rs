//! Message transports
//!
//! A transport performs one delivery attempt and says whether it went
//! through. The service ships a simulated transport only.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{DeliveryOutcome, DeliveryRecord};

/// Default probability that a simulated delivery succeeds
pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;

/// Channel that delivers a record's message to its customer
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport name
    fn name(&self) -> &str;

    /// Attempt delivery of one record
    async fn deliver(&self, record: &DeliveryRecord) -> DeliveryOutcome;
}

/// Transport with a random outcome
///
/// Succeeds with probability `success_rate`, fails otherwise.
pub struct SimulatedTransport {
    success_rate: f64,
    rng: Mutex<ChaCha8Rng>,
}

impl SimulatedTransport {
    /// Create a transport seeded from OS entropy
    pub fn new(success_rate: f64) -> Self {
        Self::with_rng(success_rate, ChaCha8Rng::from_entropy())
    }

    /// Create a transport with reproducible outcomes
    pub fn with_seed(success_rate: f64, seed: u64) -> Self {
        Self::with_rng(success_rate, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(success_rate: f64, rng: ChaCha8Rng) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// Configured success probability
    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    fn roll(&self) -> bool {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_bool(self.success_rate),
            Err(poisoned) => poisoned.into_inner().gen_bool(self.success_rate),
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_RATE)
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn deliver(&self, record: &DeliveryRecord) -> DeliveryOutcome {
        let outcome = if self.roll() {
            DeliveryOutcome::Sent
        } else {
            DeliveryOutcome::Failed
        };
        tracing::trace!(customer_id = %record.customer, %outcome, "Simulated delivery");
        outcome
    }
}
