// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by every subscriber session and the REST surface via `Arc<AppState>`.
// The history store is the single shared mutable resource; sessions own the
// rest of their state (buffers, aggregator, feed) privately.

use std::sync::Arc;

use crate::binance::ExchangeClient;
use crate::history::HistoryStore;
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub config: RuntimeConfig,
    pub store: Arc<HistoryStore>,
    pub exchange: ExchangeClient,
    /// Instant when the engine was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, store: HistoryStore) -> Self {
        let exchange = ExchangeClient::new(config.rest_base_url.clone());
        Self {
            config,
            store: Arc::new(store),
            exchange,
            start_time: std::time::Instant::now(),
        }
    }
}
