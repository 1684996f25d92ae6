//! SQLite document store
//!
//! Each collection is a table holding the JSON document next to the columns
//! used for lookups and ordering.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;

use super::DocumentStore;
use crate::error::{Error, Result};
use crate::models::{
    BatchId, Campaign, CampaignId, CommunicationBatch, Customer, CustomerId, DeliveryStatus, Order,
};

/// Fixed-width timestamp so text ordering matches time ordering
fn sort_key(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Document store backed by a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::other("SQLite connection lock poisoned"))
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                doc TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                doc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id);

            CREATE TABLE IF NOT EXISTS communications (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                doc TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                doc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_campaigns_created ON campaigns(created_at);
            "#,
        )?;
        Ok(())
    }

    fn find_doc<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row(
                &format!("SELECT doc FROM {table} WHERE id = ?1"),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        doc.map(|d| serde_json::from_str(&d)).transpose().map_err(Error::from)
    }

    fn list_docs<T: DeserializeOwned>(&self, sql: &str, args: &[&str]) -> Result<Vec<T>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            row.get::<_, String>(0)
        })?;

        let mut docs = Vec::new();
        for row in rows {
            docs.push(serde_json::from_str(&row?)?);
        }
        Ok(docs)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn save_customer(&self, customer: &Customer) -> Result<()> {
        let doc = serde_json::to_string(customer)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO customers (id, created_at, doc) VALUES (?1, ?2, ?3)",
            params![customer.id.as_str(), sort_key(&customer.created_at), doc],
        )?;
        Ok(())
    }

    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        self.find_doc("customers", id.as_str())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.list_docs("SELECT doc FROM customers ORDER BY created_at ASC", &[])
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        let doc = serde_json::to_string(order)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO orders (id, customer_id, created_at, doc) VALUES (?1, ?2, ?3, ?4)",
            params![
                order.id.as_str(),
                order.customer.as_str(),
                sort_key(&order.created_at),
                doc
            ],
        )?;
        Ok(())
    }

    async fn save_batch(&self, batch: &CommunicationBatch) -> Result<()> {
        let doc = serde_json::to_string(batch)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO communications (id, created_at, doc) VALUES (?1, ?2, ?3)",
            params![batch.id.as_str(), sort_key(&batch.created_at), doc],
        )?;
        Ok(())
    }

    async fn find_batch(&self, id: &BatchId) -> Result<Option<CommunicationBatch>> {
        self.find_doc("communications", id.as_str())
    }

    async fn update_delivery_status(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        status: DeliveryStatus,
    ) -> Result<DeliveryStatus> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let doc: Option<String> = tx
            .query_row(
                "SELECT doc FROM communications WHERE id = ?1",
                params![batch.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let doc = doc.ok_or_else(|| Error::not_found("Communication", batch))?;

        let mut stored: CommunicationBatch = serde_json::from_str(&doc)?;
        let previous = stored
            .set_status(customer, status)
            .ok_or_else(|| Error::record_not_found(batch, customer))?;

        tx.execute(
            "UPDATE communications SET doc = ?1 WHERE id = ?2",
            params![serde_json::to_string(&stored)?, batch.as_str()],
        )?;
        tx.commit()?;

        Ok(previous)
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        let doc = serde_json::to_string(campaign)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO campaigns (id, created_at, doc) VALUES (?1, ?2, ?3)",
            params![campaign.id.as_str(), sort_key(&campaign.created_at), doc],
        )?;
        Ok(())
    }

    async fn find_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>> {
        self.find_doc("campaigns", id.as_str())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        self.list_docs("SELECT doc FROM campaigns ORDER BY created_at DESC", &[])
    }
}
