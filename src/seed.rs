// =============================================================================
// Cold-start seeding — download bar history for newly watched symbols
// =============================================================================
//
// Runs once per session, spawned so it never blocks tick consumption for any
// session, and awaited before the live loop starts. A symbol is re-seeded
// only when its newest stored label is not the current minute; re-seeding
// clears the stale series first so charts don't come out jagged.

use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use crate::binance::ExchangeClient;
use crate::history::HistoryStore;

/// Seed bar history for every symbol in `symbols` that isn't fresh.
///
/// Per-symbol failures are logged and skipped; seeding never aborts the
/// session that requested it.
pub async fn seed_history(
    store: Arc<HistoryStore>,
    client: ExchangeClient,
    symbols: Vec<String>,
    seed_limit: usize,
) {
    let now_label = Local::now().format("%H:%M").to_string();

    for symbol in &symbols {
        let fresh = match store.latest_label(symbol) {
            Ok(Some(label)) => label == now_label,
            Ok(None) => false,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "freshness check failed — re-seeding");
                false
            }
        };
        if fresh {
            continue;
        }

        info!(symbol = %symbol, "downloading seed history");
        let bars = match client.minute_closes(symbol, seed_limit).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "seed fetch failed — skipping");
                continue;
            }
        };

        if let Err(e) = store.delete_all(symbol) {
            warn!(symbol = %symbol, error = %e, "failed to clear stale series — skipping");
            continue;
        }
        if let Err(e) = store.bulk_load(symbol, &bars) {
            warn!(symbol = %symbol, error = %e, "seed bulk load failed");
            continue;
        }
        info!(symbol = %symbol, bars = bars.len(), "seed history loaded");
    }
}
