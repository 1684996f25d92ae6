use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outreach::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "outreach",
    version,
    about = "Marketing campaign backend with audience fan-out delivery",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Bind address (host:port)
        #[arg(short, long)]
        bind: Option<String>,

        /// Storage backend (memory, sqlite)
        #[arg(short, long)]
        storage: Option<String>,

        /// SQLite database path
        #[arg(long)]
        sqlite_path: Option<PathBuf>,
    },

    /// Print delivery counts of a stored audience
    Summary {
        /// Communication batch ID
        #[arg(short, long)]
        batch: String,
    },

    /// Deliver a stored audience and wait for every attempt
    Dispatch {
        /// Communication batch ID
        #[arg(short, long)]
        batch: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Serve {
            bind,
            storage,
            sqlite_path,
        } => {
            tracing::info!(
                bind = ?bind,
                storage = ?storage,
                sqlite_path = ?sqlite_path,
                "Starting serve command"
            );
            commands::serve(
                config,
                commands::ServeParams {
                    bind,
                    storage,
                    sqlite_path,
                },
            )
            .await?;
        }

        Commands::Summary { batch } => {
            tracing::info!(batch = %batch, "Starting summary command");
            commands::summary(config, batch).await?;
        }

        Commands::Dispatch { batch } => {
            tracing::info!(batch = %batch, "Starting dispatch command");
            commands::dispatch(config, batch).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("outreach=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("outreach={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
