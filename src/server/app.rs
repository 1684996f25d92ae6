//! Outreach HTTP server
//!
//! Wires the document store and the services into shared state and serves
//! the REST API.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::campaign::CampaignService;
use crate::config::Config;
use crate::customers::CustomerService;
use crate::delivery::DeliveryService;
use crate::storage::{self, SharedStore};

use super::api::create_router;
use super::config::ServerConfig;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Customers and orders
    pub customers: CustomerService,

    /// Audience creation, dispatch and status tracking
    pub delivery: DeliveryService,

    /// Campaigns
    pub campaigns: CampaignService,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Build services on top of a store
    pub fn new(store: SharedStore, delivery: DeliveryService) -> Self {
        Self {
            customers: CustomerService::new(store.clone()),
            campaigns: CampaignService::new(store.clone()),
            delivery,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// App Server
// ============================================================================

/// Main outreach server
pub struct AppServer {
    config: ServerConfig,
    state: AppState,
}

impl AppServer {
    /// Create a server from full configuration, opening the configured store
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let store = storage::open(&config.storage).map_err(|e| ServerError::Init(e.to_string()))?;
        Self::with_store(config, store)
    }

    /// Create a server on top of an existing store
    pub fn with_store(config: &Config, store: SharedStore) -> Result<Self, ServerError> {
        let delivery = DeliveryService::from_config(store.clone(), config)
            .map_err(|e| ServerError::Init(e.to_string()))?;

        Ok(Self {
            config: config.server.clone(),
            state: AppState::new(store, delivery),
        })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(%addr, "Outreach server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Outreach server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            reporter: self.state.delivery.dispatcher().reporter_name().to_string(),
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub reporter: String,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Outreach Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Status Reporter: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.reporter,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),

    /// Failed to bind to address
    #[error("Failed to bind: {0}")]
    Bind(String),

    /// Server error
    #[error("Server error: {0}")]
    Serve(String),
}
