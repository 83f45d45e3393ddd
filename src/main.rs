//! FlightSurety oracle server
//!
//! Authorizes the app contract on the data contract, registers the oracle
//! accounts, logs every `OracleRequest` the app contract emits and serves a
//! static acknowledgement on `GET /api`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flightsurety::chain::{ChainClient, EventSource, HttpTransport};
use flightsurety::config::AppConfig;
use flightsurety::contract::FlightSuretyContract;
use flightsurety::models::OracleRegistry;
use flightsurety::routes;
use flightsurety::services::{relay_oracle_requests, OracleBootstrapper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    info!(network = %config.network, url = %config.contracts.url, "using network");

    let client = Arc::new(ChainClient::new(HttpTransport::new(config.contracts.url.clone())));
    let contract = Arc::new(
        FlightSuretyContract::connect(client, &config.contracts)
            .await
            .context("failed to connect to node")?
            .with_gas(config.oracle_gas),
    );

    let source = match config.event_poll_interval {
        Some(interval) => EventSource::Polling(interval),
        None => EventSource::WebSocket(config.contracts.websocket_url()),
    };
    let registry = OracleRegistry::new();
    let relay = tokio::spawn(relay_oracle_requests(contract.events(source), registry.clone()));

    let bootstrapper =
        OracleBootstrapper::new(Arc::clone(&contract), registry, config.oracles_count);
    tokio::spawn(async move {
        // Registrations report their own failures.
        let _registrations = bootstrapper.run().await;
    });

    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    let app = routes::app(&allowed_origins);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    relay.abort();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}
