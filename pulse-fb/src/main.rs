//! Feedback Service (pulse-fb) - Main entry point
//!
//! Accepts customer feedback over HTTP, enriches each entry with
//! LLM-derived response, summary, and action items, and persists
//! the result to the append-only feedback store.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_common::events::EventBus;
use pulse_fb::config::ServiceConfig;
use pulse_fb::services::EnrichmentClient;
use pulse_fb::{build_router, AppState};

/// Command-line arguments for pulse-fb
#[derive(Parser, Debug)]
#[command(name = "pulse-fb")]
#[command(about = "Customer feedback microservice for Pulse")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the feedback database file
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse_fb=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    // Resolve configuration once; handlers only ever see this snapshot
    let config = ServiceConfig::resolve(
        args.config.as_deref(),
        args.port,
        args.database.as_deref(),
    )
    .context("Failed to resolve configuration")?;

    info!("Starting Pulse feedback service on port {}", config.port);
    info!("Database: {}", config.database_path.display());

    let db = pulse_fb::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database initialized");

    let event_bus = EventBus::new(100);
    let enricher =
        EnrichmentClient::new(&config.provider).context("Failed to build enrichment client")?;

    let state = AppState::new(db, event_bus, enricher, config.limits);
    let app = build_router(state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Starting HTTP server on {}", addr);

    // Create and run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
