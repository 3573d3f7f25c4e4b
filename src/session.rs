// =============================================================================
// Subscriber session — per-connection broadcast scheduler
// =============================================================================
//
// One Session per WebSocket subscriber. The loop is strictly sequential
// (ticks, bar closes, broadcasts never interleave within a session), which
// guarantees at most one in-flight recompute per session. Two cadences:
//
//   bar-close  — minute boundary crossed: persist the closed bars, full
//                recompute from the freshly warmed buffers, broadcast.
//   live-tick  — ≥ live_broadcast_ms since the last broadcast: recompute
//                from buffers only, no persistence.
//
// Message protocol: one {"type": "history_batch"} on subscribe, then
// {"type": "live_update"} until the client disconnects or the feed dies.
// Store and computation failures degrade single cycles; only feed loss
// terminates the session.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use chrono::Local;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::aggregator::BarAggregator;
use crate::app_state::AppState;
use crate::market_data::{self, TickBuffers};
use crate::seed;
use crate::stats::{self, StatsSnapshot};
use crate::types::{SubscribeParams, Tick};

/// Feed channel depth; back-pressures the feed task if a session stalls.
const TICK_CHANNEL_CAPACITY: usize = 1024;

pub struct Session {
    id: Uuid,
    state: Arc<AppState>,
    params: SubscribeParams,
    buffers: TickBuffers,
    aggregator: BarAggregator,
    last_broadcast: Instant,
}

impl Session {
    pub fn new(state: Arc<AppState>, params: SubscribeParams) -> Self {
        let buffers = TickBuffers::new(&params.symbols);
        Self {
            id: Uuid::new_v4(),
            state,
            params,
            buffers,
            aggregator: BarAggregator::new(),
            last_broadcast: Instant::now(),
        }
    }

    /// Drive the session until the client disconnects or the feed ends.
    pub async fn run(mut self, socket: WebSocket) {
        info!(
            session = %self.id,
            symbols = ?self.params.symbols,
            primary = %self.params.primary,
            secondary = %self.params.secondary,
            window = self.params.window,
            "session started"
        );

        let (mut sender, mut receiver) = socket.split();

        // 1. Cold-start seeding — spawned so it cannot block tick consumption
        //    anywhere, awaited once before the live loop.
        let seed_task = tokio::spawn(seed::seed_history(
            self.state.store.clone(),
            self.state.exchange.clone(),
            self.params.symbols.clone(),
            self.state.config.seed_limit,
        ));
        if let Err(e) = seed_task.await {
            warn!(session = %self.id, error = %e, "seed task panicked — continuing unseeded");
        }

        // 2. Initial history batch.
        let history = self.chart_history();
        if send_tagged(&mut sender, "history_batch", json!(history))
            .await
            .is_err()
        {
            info!(session = %self.id, "client gone before history batch");
            return;
        }

        // 3. Upstream feed for this session's watched set.
        let (tick_tx, mut tick_rx) = mpsc::channel::<Tick>(TICK_CHANNEL_CAPACITY);
        let feed_base = self.state.config.feed_base_url.clone();
        let feed_symbols = self.params.symbols.clone();
        let session_id = self.id;
        let feed_task = tokio::spawn(async move {
            if let Err(e) = market_data::run_tick_stream(&feed_base, &feed_symbols, tick_tx).await {
                error!(session = %session_id, error = %e, "trade feed failed");
            }
        });

        // 4. Sequential live loop.
        let broadcast_every = Duration::from_millis(self.state.config.live_broadcast_ms);
        let mut cadence = interval(broadcast_every);

        loop {
            tokio::select! {
                // ── Ticks ───────────────────────────────────────────────
                tick = tick_rx.recv() => {
                    match tick {
                        Some(tick) => {
                            self.buffers.ingest(&tick.symbol, tick.price);
                        }
                        None => {
                            // Feed task finished: disconnect or error either
                            // way the session is over; client may resubscribe.
                            warn!(session = %self.id, "tick feed ended — closing session");
                            break;
                        }
                    }
                }

                // ── Broadcast cadence ───────────────────────────────────
                _ = cadence.tick() => {
                    let now = Local::now();
                    if let Some(label) = self.aggregator.observe(now) {
                        self.close_bars(&label);
                        let snapshot = self.recompute();
                        if send_tagged(&mut sender, "live_update", json!(snapshot)).await.is_err() {
                            break;
                        }
                        self.last_broadcast = Instant::now();
                    } else if self.last_broadcast.elapsed() >= broadcast_every {
                        let snapshot = self.recompute();
                        if send_tagged(&mut sender, "live_update", json!(snapshot)).await.is_err() {
                            break;
                        }
                        self.last_broadcast = Instant::now();
                    }
                }

                // ── Client frames ───────────────────────────────────────
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Ping(data))) => {
                            if sender.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(session = %self.id, "client disconnected");
                            break;
                        }
                        Some(Ok(_)) => {
                            debug!(session = %self.id, "ignoring client frame");
                        }
                        Some(Err(e)) => {
                            warn!(session = %self.id, error = %e, "client receive error");
                            break;
                        }
                    }
                }
            }
        }

        // Teardown releases only this session's feed and state.
        feed_task.abort();
        info!(session = %self.id, "session closed");
    }

    // -------------------------------------------------------------------------
    // Bar-close cycle
    // -------------------------------------------------------------------------

    /// Persist one bar per non-empty buffer as a single batch, then warm the
    /// buffers with the carried-forward closing prices. On a store failure
    /// the cycle degrades: buffers keep accumulating until the next boundary.
    fn close_bars(&mut self, label: &str) {
        let bars = self.buffers.close_bars(label);
        if bars.is_empty() {
            return;
        }
        match self.state.store.insert_batch(&bars) {
            Ok(()) => {
                debug!(session = %self.id, label = %label, bars = bars.len(), "bar batch committed");
                self.buffers.carry_forward();
            }
            Err(e) => {
                error!(session = %self.id, label = %label, error = %e, "bar commit failed — cycle degraded");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Recompute
    // -------------------------------------------------------------------------

    /// Full statistics recompute over the bounded history. Never fails: a
    /// store error degrades to a zeroed snapshot and the cadence continues.
    fn recompute(&self) -> StatsSnapshot {
        let label = Local::now().format("%H:%M").to_string();
        let prices = self.current_prices();

        let per_symbol = self.state.config.live_history_rows(self.params.window);
        match self.state.store.query_recent(&self.params.symbols, per_symbol) {
            Ok(rows) => stats::compute_snapshot(
                label,
                &rows,
                prices,
                &self.params.primary,
                &self.params.secondary,
                self.params.window,
            ),
            Err(e) => {
                error!(session = %self.id, error = %e, "history query failed — zeroed snapshot");
                StatsSnapshot::zeroed(label, prices)
            }
        }
    }

    /// Latest tick per symbol, falling back to the most recent persisted bar,
    /// else 0.
    fn current_prices(&self) -> HashMap<String, f64> {
        self.params
            .symbols
            .iter()
            .map(|sym| {
                let price = self.buffers.latest(sym).unwrap_or_else(|| {
                    self.state
                        .store
                        .last_price(sym)
                        .unwrap_or_default()
                        .unwrap_or(0.0)
                });
                (sym.clone(), price)
            })
            .collect()
    }

    /// Chart-view history: the trailing `chart_rows` derived rows.
    fn chart_history(&self) -> Vec<serde_json::Value> {
        let rows = match self.state.store.query(&self.params.symbols) {
            Ok(rows) => rows,
            Err(e) => {
                error!(session = %self.id, error = %e, "history batch query failed");
                return Vec::new();
            }
        };
        let mut derived = stats::history_rows(
            &rows,
            &self.params.primary,
            &self.params.secondary,
            self.params.window,
        );
        let keep = self.state.config.chart_rows;
        if derived.len() > keep {
            derived.drain(..derived.len() - keep);
        }
        derived
    }
}

/// Serialize and send one tagged message.
async fn send_tagged<S>(
    sender: &mut S,
    kind: &str,
    data: serde_json::Value,
) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    let payload = json!({ "type": kind, "data": data });
    sender.send(Message::Text(payload.to_string())).await
}
