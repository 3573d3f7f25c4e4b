// =============================================================================
// WebSocket Handler — pair-statistics subscription
// =============================================================================
//
// Clients connect to `/ws?watchlist=a,b,c&primary=a&secondary=b&window=30`
// and receive:
//   1. An immediate `history_batch` of derived chart rows.
//   2. A `live_update` snapshot at the broadcast cadence and on every minute
//      boundary.
//
// Each connection owns an independent Session with its own tick buffers and
// upstream feed; see `session.rs` for the loop itself.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::app_state::AppState;
use crate::session::Session;
use crate::types::SubscribeParams;

// =============================================================================
// Query parameters
// =============================================================================

#[derive(Deserialize)]
pub struct WsQuery {
    watchlist: Option<String>,
    primary: Option<String>,
    secondary: Option<String>,
    window: Option<usize>,
}

// =============================================================================
// WebSocket upgrade handler
// =============================================================================

/// Axum handler for the subscription upgrade request.
///
/// Missing parameters fall back to the default btcusdt/ethusdt pair with a
/// 30-bar window; the pair legs are always merged into the watched set.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    let watchlist = query.watchlist.unwrap_or_else(|| "btcusdt".to_string());
    let primary = query.primary.unwrap_or_else(|| "btcusdt".to_string());
    let secondary = query.secondary.unwrap_or_else(|| "ethusdt".to_string());
    let window = query.window.unwrap_or(30);

    let params = SubscribeParams::normalise(&watchlist, &primary, &secondary, window);

    info!(
        symbols = ?params.symbols,
        primary = %params.primary,
        secondary = %params.secondary,
        window = params.window,
        "subscription accepted — upgrading"
    );

    ws.on_upgrade(move |socket| Session::new(state, params).run(socket))
}
