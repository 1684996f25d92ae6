use anyhow::{Context, Result};
use std::path::PathBuf;

use outreach::config::Config;
use outreach::metrics;
use outreach::server::AppServer;

/// Command-line overrides for the server
pub struct ServeParams {
    pub bind: Option<String>,
    pub storage: Option<String>,
    pub sqlite_path: Option<PathBuf>,
}

/// Run the HTTP server until Ctrl+C
pub async fn serve(mut config: Config, params: ServeParams) -> Result<()> {
    if let Some(bind) = params.bind {
        config.server.bind_address = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {bind}"))?;
    }
    if let Some(storage) = params.storage {
        config.storage.backend = storage.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(path) = params.sqlite_path {
        config.storage.sqlite_path = path;
    }

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!("Failed to initialize metrics: {}", e);
    }

    let server = AppServer::new(&config).context("Failed to create outreach server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  POST /customers               - Create customer");
    println!("  POST /orders                  - Create order");
    println!("  GET  /get-filtered-customers  - Filter customers");
    println!("  POST /save-audience           - Save audience and deliver");
    println!("  POST /update-status           - Delivery status callback");
    println!("  GET  /campaigns               - List campaigns");
    println!("  POST /campaigns               - Create campaign");
    println!("  GET  /campaign/{{id}}           - Campaign view");
    println!("  GET  /api/health              - Health check");
    println!("  GET  /metrics                 - Prometheus metrics endpoint");
    println!();
    println!("Press Ctrl+C to stop.\n");

    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Outreach server stopped.");
    Ok(())
}
