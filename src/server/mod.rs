//! HTTP server for the outreach backend
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Outreach Server             │
//! │                                          │
//! │  ┌────────────────────────────────────┐  │
//! │  │            REST API                │  │
//! │  │  POST /customers                   │  │
//! │  │  POST /orders                      │  │
//! │  │  GET  /get-filtered-customers      │  │
//! │  │  POST /save-audience               │  │
//! │  │  POST /update-status               │  │
//! │  │  GET  /campaigns  POST /campaigns  │  │
//! │  │  GET  /campaign/{id}               │  │
//! │  │  GET  /api/health  GET /metrics    │  │
//! │  └────────────────────────────────────┘  │
//! │                    │                     │
//! │                    ▼                     │
//! │  ┌────────────────────────────────────┐  │
//! │  │  Customer / Delivery / Campaign    │  │
//! │  │            services                │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use outreach::config::Config;
//! use outreach::server::AppServer;
//!
//! let server = AppServer::new(&Config::from_env()?)?;
//! server.start().await?;
//! ```

pub mod api;
pub mod app;
pub mod client;
pub mod config;

// Re-export main types
pub use app::{AppServer, AppState, ServerError, ServerInfo};
pub use client::{ClientConfig, StatusClient};
pub use config::ServerConfig;
