// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All HTTP endpoints live under `/api/v1/`; the subscription WebSocket is
// mounted at `/ws`. Every endpoint is public.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::app_state::AppState;
use crate::error::EngineError;
use crate::stats;
use crate::types::SubscribeParams;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/export", get(export))
        .route("/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// =============================================================================
// Tradable symbols
// =============================================================================

/// USDT spot markets currently trading on the exchange. Falls back to a
/// small static set when the exchange is unreachable.
async fn symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let symbols = state.exchange.usdt_symbols().await;
    Json(serde_json::json!({ "symbols": symbols }))
}

// =============================================================================
// Full-history export
// =============================================================================

#[derive(Deserialize)]
struct ExportQuery {
    primary: String,
    secondary: String,
    #[serde(default = "default_window")]
    window: usize,
}

fn default_window() -> usize {
    30
}

/// Every persisted row for the pair, in arrival order, with the same derived
/// columns the live chart receives. The chart view is always a suffix of this
/// export.
async fn export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, EngineError> {
    let params =
        SubscribeParams::normalise("", &query.primary, &query.secondary, query.window);
    if params.primary.is_empty() || params.secondary.is_empty() {
        return Err(EngineError::Computation(
            "export requires non-empty primary and secondary symbols".to_string(),
        ));
    }

    let rows = state.store.query(&params.symbols).map_err(|e| {
        error!(primary = %params.primary, secondary = %params.secondary, error = %e, "export query failed");
        e
    })?;

    let derived = stats::history_rows(&rows, &params.primary, &params.secondary, params.window);
    Ok(Json(derived))
}
