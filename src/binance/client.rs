// =============================================================================
// Exchange REST client — symbol discovery & kline seeding
// =============================================================================
//
// Only public (unsigned) endpoints are used: exchangeInfo for symbol
// discovery and klines for cold-start bar seeding. The exchange is otherwise
// opaque to the engine.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use tracing::{debug, instrument, warn};

use crate::types::Bar;

/// Static fallback when symbol discovery is unreachable.
const FALLBACK_SYMBOLS: &[&str] = &["BTCUSDT", "ETHUSDT", "SOLUSDT"];

/// Unsigned exchange REST client.
#[derive(Clone)]
pub struct ExchangeClient {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Symbol discovery (opaque, non-core)
    // -------------------------------------------------------------------------

    /// GET /api/v3/exchangeInfo — tradeable USDT symbols, sorted.
    ///
    /// Falls back to a small static list on any failure so the UI always has
    /// something to offer.
    #[instrument(skip(self), name = "exchange::usdt_symbols")]
    pub async fn usdt_symbols(&self) -> Vec<String> {
        match self.fetch_exchange_info().await {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(error = %e, "symbol discovery failed — using fallback list");
                FALLBACK_SYMBOLS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    async fn fetch_exchange_info(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let body: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v3/exchangeInfo request failed")?
            .error_for_status()
            .context("exchangeInfo returned error status")?
            .json()
            .await
            .context("failed to parse exchangeInfo response")?;

        let mut symbols: Vec<String> = body["symbols"]
            .as_array()
            .context("exchangeInfo response missing 'symbols' array")?
            .iter()
            .filter(|s| {
                s["symbol"].as_str().is_some_and(|name| name.ends_with("USDT"))
                    && s["status"].as_str() == Some("TRADING")
            })
            .filter_map(|s| s["symbol"].as_str().map(str::to_string))
            .collect();
        symbols.sort();

        debug!(count = symbols.len(), "tradeable USDT symbols discovered");
        Ok(symbols)
    }

    // -------------------------------------------------------------------------
    // Kline seeding
    // -------------------------------------------------------------------------

    /// GET /api/v3/klines — the most recent `limit` one-minute closes for
    /// `symbol`, as bars labelled with the candle's local `HH:MM`.
    #[instrument(skip(self), name = "exchange::minute_closes")]
    pub async fn minute_closes(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval=1m&limit={}",
            self.base_url,
            symbol.to_uppercase(),
            limit
        );
        let body: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v3/klines request failed")?
            .error_for_status()
            .context("klines returned error status")?
            .json()
            .await
            .context("failed to parse klines response")?;

        let candles = body
            .as_array()
            .context("klines response is not an array")?;

        let mut bars = Vec::with_capacity(candles.len());
        for candle in candles {
            let open_ms = candle[0].as_i64().context("missing kline open time")?;
            let close: f64 = candle[4]
                .as_str()
                .context("missing kline close price")?
                .parse()
                .context("failed to parse kline close price")?;
            bars.push(Bar::new(
                minute_label(open_ms),
                symbol.to_lowercase(),
                close,
            ));
        }

        debug!(symbol = %symbol, bars = bars.len(), "minute closes fetched");
        Ok(bars)
    }
}

/// `HH:MM` local clock label for an epoch-millisecond timestamp.
fn minute_label(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => "00:00".to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_label_shape() {
        let label = minute_label(1700000000000);
        assert_eq!(label.len(), 5);
        assert_eq!(label.as_bytes()[2], b':');
    }

    #[test]
    fn fallback_symbols_nonempty() {
        assert!(!FALLBACK_SYMBOLS.is_empty());
        assert!(FALLBACK_SYMBOLS.iter().all(|s| s.ends_with("USDT")));
    }
}
