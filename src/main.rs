// =============================================================================
// Pairscope — Main Entry Point
// =============================================================================
//
// Pair-statistics engine: per-subscriber tick aggregation into one-minute
// bars, rolling pair statistics (z-score, correlation, beta, half-life,
// correlation heatmap) pushed over WebSocket at a fixed cadence.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod aggregator;
mod api;
mod app_state;
mod binance;
mod error;
mod history;
mod market_data;
mod runtime_config;
mod seed;
mod session;
mod stats;
mod types;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::history::HistoryStore;
use crate::runtime_config::RuntimeConfig;

/// SQLite pool size; sessions and the REST surface share it.
const DB_POOL_SIZE: u32 = 8;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Pairscope — Starting Up                          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config = RuntimeConfig::load("runtime_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let mut config = RuntimeConfig::default();
        config.apply_env_overrides();
        config
    });

    // ── 2. Bar-history store ─────────────────────────────────────────────
    let store = HistoryStore::open(&config.db_path, DB_POOL_SIZE)?;
    info!(db_path = %config.db_path, "bar-history store opened");

    // ── 3. Shared state ──────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, store));

    // ── 4. HTTP + WebSocket server ───────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Pairscope shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    warn!("Shutdown signal received — stopping gracefully");
}
