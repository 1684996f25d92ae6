// Core documents for the outreach backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Message sent to every customer of a saved audience
pub fn audience_message(customer_name: &str) -> String {
    format!("Hi {customer_name}, here is 10% off on your next order")
}

// ============================================================================
// Document IDs
// ============================================================================

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random ID
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Wrap an existing ID without checking its format
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Parse a well-formed (UUID) ID
            pub fn parse(id: &str) -> Option<Self> {
                uuid::Uuid::parse_str(id.trim())
                    .ok()
                    .map(|uuid| Self(uuid.to_string()))
            }

            /// Borrow the raw ID
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

document_id!(
    /// Customer (user) document ID
    CustomerId
);
document_id!(
    /// Order document ID
    OrderId
);
document_id!(
    /// Communication batch document ID
    BatchId
);
document_id!(
    /// Campaign document ID
    CampaignId
);

// ============================================================================
// Customer & Order
// ============================================================================

/// Customer record with running spend statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub total_spend: f64,
    pub total_visits: u64,
    pub last_visit: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a customer with zeroed statistics
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: &str) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerId::generate(),
            name: name.into(),
            email: email.into(),
            password_hash: hash_password(password),
            total_spend: 0.0,
            total_visits: 0,
            last_visit: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the effect of a placed order on the spend statistics
    pub fn record_purchase(&mut self, price: f64, quantity: u32) {
        let now = Utc::now();
        self.total_spend += price * f64::from(quantity);
        self.total_visits += 1;
        self.last_visit = now;
        self.updated_at = now;
    }
}

/// SHA-256 hex digest of a password
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Customer as returned by the API (no credentials)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub total_spend: f64,
    pub total_visits: u64,
    pub last_visit: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.clone(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            total_spend: customer.total_spend,
            total_visits: customer.total_visits,
            last_visit: customer.last_visit,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

/// Order placed by a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer: CustomerId,
    pub product: String,
    pub quantity: u32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(customer: CustomerId, product: impl Into<String>, quantity: u32, price: f64) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            customer,
            product: product.into(),
            quantity,
            price,
            created_at: now,
            updated_at: now,
        }
    }

    /// Order value (price x quantity)
    pub fn total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

// ============================================================================
// Delivery Status
// ============================================================================

/// Delivery status of one record in a communication batch
///
/// Legal transitions are `Pending -> Sent` and `Pending -> Failed`. Status
/// updates are still applied unconditionally; [`DeliveryStatus::can_transition_to`]
/// only tells whether an update followed the regular path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "sent")]
    Sent,
    #[serde(alias = "failed")]
    Failed,
}

impl DeliveryStatus {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
        }
    }

    /// Whether a delivery outcome has been recorded
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether `next` follows the regular lifecycle from this status
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Sent) | (Self::Pending, Self::Failed)
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SENT" => Ok(Self::Sent),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("Unknown delivery status: {other}")),
        }
    }
}

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        DeliveryStatus::from(*self).as_str()
    }
}

impl From<DeliveryOutcome> for DeliveryStatus {
    fn from(outcome: DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Sent => Self::Sent,
            DeliveryOutcome::Failed => Self::Failed,
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<DeliveryStatus>()? {
            DeliveryStatus::Sent => Ok(Self::Sent),
            DeliveryStatus::Failed => Ok(Self::Failed),
            DeliveryStatus::Pending => Err("PENDING is not a delivery outcome".to_string()),
        }
    }
}

// ============================================================================
// Communication Batch
// ============================================================================

/// One customer's message and delivery status within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub customer: CustomerId,
    pub message: String,
    #[serde(default)]
    pub status: DeliveryStatus,
}

impl DeliveryRecord {
    pub fn new(customer: CustomerId, message: impl Into<String>) -> Self {
        Self {
            customer,
            message: message.into(),
            status: DeliveryStatus::Pending,
        }
    }

    /// Record carrying the audience promotion for a customer
    pub fn for_customer(customer: &Customer) -> Self {
        Self::new(customer.id.clone(), audience_message(&customer.name))
    }
}

/// Group of delivery records created together
///
/// The customer list is fixed at creation. Duplicate customer references are
/// kept as given; status updates apply to the first matching record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationBatch {
    pub id: BatchId,
    #[serde(rename = "customers")]
    pub records: Vec<DeliveryRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommunicationBatch {
    pub fn new(records: Vec<DeliveryRecord>) -> Self {
        let now = Utc::now();
        Self {
            id: BatchId::generate(),
            records,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the status of the first record addressed to `customer`
    ///
    /// Returns the previous status, or `None` if the customer is not in the batch.
    pub fn set_status(
        &mut self,
        customer: &CustomerId,
        status: DeliveryStatus,
    ) -> Option<DeliveryStatus> {
        let record = self.records.iter_mut().find(|r| &r.customer == customer)?;
        let previous = std::mem::replace(&mut record.status, status);
        self.updated_at = Utc::now();
        Some(previous)
    }
}

// ============================================================================
// Campaign
// ============================================================================

/// Campaign targeting one audience batch
///
/// The audience may be absent or point at a batch that does not exist;
/// neither is checked when the campaign is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<BatchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        audience: impl Into<Option<BatchId>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CampaignId::generate(),
            name: name.into(),
            description: description.into(),
            audience: audience.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
