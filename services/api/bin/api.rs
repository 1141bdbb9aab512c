//! Main Entrypoint for the Math Buddy API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Building the companion pipeline for the configured provider.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use mathbuddy_api::{config::Config, router::create_router, state::AppState};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let app_state = Arc::new(AppState::from_config(config.clone()));

    // --- 4. Create Router (CORS is applied inside) ---
    let app = create_router(app_state);

    // --- 5. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.model,
        time_budget_ms = config.time_budget.as_millis() as u64,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
