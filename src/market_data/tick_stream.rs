// =============================================================================
// Upstream tick feed — Binance combined trade stream
// =============================================================================
//
// One WebSocket connection per subscriber session, subscribed to the
// session's watched symbols. The transport is opaque to the rest of the
// engine: the session sees a plain stream of `Tick`s. Malformed frames are
// dropped with a warning; a transport error terminates only this feed.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, warn};

use crate::types::Tick;

/// Build the combined-stream URL for the watched symbol set.
///
/// Shape: `wss://.../stream?streams=btcusdt@trade/ethusdt@trade`.
pub fn build_stream_url(base_url: &str, symbols: &[String]) -> String {
    let streams: Vec<String> = symbols
        .iter()
        .map(|s| format!("{}@trade", s.to_lowercase()))
        .collect();
    format!("{}/stream?streams={}", base_url, streams.join("/"))
}

/// Parse one trade frame into a `Tick`.
///
/// Supports both the combined-stream envelope and a direct payload:
/// ```json
/// { "stream": "btcusdt@trade", "data": { "s": "BTCUSDT", "p": "37000.00", "E": 1700000000000 } }
/// ```
pub fn parse_trade_event(text: &str) -> Result<Tick> {
    let root: serde_json::Value =
        serde_json::from_str(text).context("failed to parse trade JSON")?;

    let data = if root.get("data").is_some() {
        &root["data"]
    } else {
        &root
    };

    let symbol = data["s"]
        .as_str()
        .context("missing field s")?
        .to_lowercase();

    let price: f64 = data["p"]
        .as_str()
        .context("missing field p")?
        .parse()
        .context("failed to parse price")?;

    Ok(Tick { symbol, price })
}

/// Connect to the trade stream for `symbols` and pump ticks into `tx`.
///
/// Returns when the stream disconnects (Ok) or errors (Err). The caller owns
/// the policy: a session treats either outcome as end-of-feed for itself
/// only.
pub async fn run_tick_stream(
    base_url: &str,
    symbols: &[String],
    tx: mpsc::Sender<Tick>,
) -> Result<()> {
    let url = build_stream_url(base_url, symbols);
    info!(url = %url, "connecting to trade feed");

    let (ws_stream, _response) = connect_async(&url)
        .await
        .context("failed to connect to trade feed")?;

    info!(symbols = ?symbols, "trade feed connected");
    let (_write, mut read) = ws_stream.split();

    loop {
        match read.next().await {
            Some(Ok(msg)) => {
                if let tokio_tungstenite::tungstenite::Message::Text(text) = msg {
                    match parse_trade_event(&text) {
                        Ok(tick) => {
                            if tx.send(tick).await.is_err() {
                                // Session gone — stop pumping.
                                debug!("tick receiver dropped; closing feed");
                                return Ok(());
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "dropping malformed trade frame");
                        }
                    }
                }
                // Ping/Pong/Binary/Close frames are handled by tungstenite.
            }
            Some(Err(e)) => {
                error!(error = %e, "trade feed read error");
                return Err(e.into());
            }
            None => {
                warn!("trade feed stream ended");
                return Ok(());
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_contains_all_streams() {
        let url = build_stream_url(
            "wss://stream.binance.com:9443",
            &["BTCUSDT".to_string(), "ethusdt".to_string()],
        );
        assert_eq!(
            url,
            "wss://stream.binance.com:9443/stream?streams=btcusdt@trade/ethusdt@trade"
        );
    }

    #[test]
    fn parse_combined_stream_frame() {
        let json = r#"{
            "stream": "btcusdt@trade",
            "data": {
                "e": "trade",
                "E": 1700000000123,
                "s": "BTCUSDT",
                "p": "37000.50",
                "q": "0.010"
            }
        }"#;
        let tick = parse_trade_event(json).expect("should parse");
        assert_eq!(tick.symbol, "btcusdt");
        assert!((tick.price - 37000.50).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_direct_frame_without_envelope() {
        let json = r#"{ "e": "trade", "E": 1, "s": "ETHUSDT", "p": "2000.0" }"#;
        let tick = parse_trade_event(json).expect("should parse");
        assert_eq!(tick.symbol, "ethusdt");
        assert_eq!(tick.price, 2000.0);
    }

    #[test]
    fn malformed_frames_are_errors_not_panics() {
        assert!(parse_trade_event("not json").is_err());
        assert!(parse_trade_event(r#"{ "s": "BTCUSDT" }"#).is_err());
        assert!(parse_trade_event(r#"{ "p": "1.0" }"#).is_err());
        assert!(parse_trade_event(r#"{ "s": "BTCUSDT", "p": "not-a-number" }"#).is_err());
    }
}
