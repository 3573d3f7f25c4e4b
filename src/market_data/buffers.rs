// =============================================================================
// Live tick buffers — per-symbol prices since the last bar close
// =============================================================================
//
// Owned by a single session loop, so no locking: a session's ticks, bar
// closes and broadcasts are strictly sequential. Symbols outside the watched
// set are discarded silently.

use std::collections::HashMap;

use crate::types::Bar;

/// Per-symbol ordered tick prices for one subscriber session.
#[derive(Debug)]
pub struct TickBuffers {
    /// Watched set in subscription order.
    symbols: Vec<String>,
    buffers: HashMap<String, Vec<f64>>,
}

impl TickBuffers {
    pub fn new(symbols: &[String]) -> Self {
        let buffers = symbols.iter().map(|s| (s.clone(), Vec::new())).collect();
        Self {
            symbols: symbols.to_vec(),
            buffers,
        }
    }

    /// Route one tick: append if the (lower-cased) symbol is watched.
    /// Returns whether the tick was accepted.
    pub fn ingest(&mut self, symbol: &str, price: f64) -> bool {
        let key = symbol.to_lowercase();
        match self.buffers.get_mut(&key) {
            Some(buf) => {
                buf.push(price);
                true
            }
            None => false,
        }
    }

    /// Latest buffered price for a symbol, if any ticks arrived this interval.
    pub fn latest(&self, symbol: &str) -> Option<f64> {
        self.buffers.get(symbol).and_then(|b| b.last().copied())
    }

    /// Close one bar per non-empty buffer (last tick wins) under `label`.
    /// Buffers are left untouched; call [`carry_forward`] after the batch
    /// commit succeeds.
    ///
    /// [`carry_forward`]: TickBuffers::carry_forward
    pub fn close_bars(&self, label: &str) -> Vec<Bar> {
        self.symbols
            .iter()
            .filter_map(|sym| {
                self.buffers[sym]
                    .last()
                    .map(|price| Bar::new(label, sym.clone(), *price))
            })
            .collect()
    }

    /// Reset every non-empty buffer to a single element holding its closing
    /// price, so the next interval starts warm. Empty buffers stay empty.
    pub fn carry_forward(&mut self) {
        for buf in self.buffers.values_mut() {
            if let Some(&last) = buf.last() {
                buf.clear();
                buf.push(last);
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self, symbol: &str) -> usize {
        self.buffers.get(symbol).map_or(0, Vec::len)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn syms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ingest_filters_unwatched_and_lowercases() {
        let mut buf = TickBuffers::new(&syms(&["btcusdt", "ethusdt"]));
        assert!(buf.ingest("BTCUSDT", 100.0));
        assert!(buf.ingest("btcusdt", 101.0));
        assert!(!buf.ingest("solusdt", 1.0));

        assert_eq!(buf.latest("btcusdt"), Some(101.0));
        assert_eq!(buf.latest("ethusdt"), None);
    }

    #[test]
    fn close_bars_last_tick_wins_and_skips_empty() {
        let mut buf = TickBuffers::new(&syms(&["btcusdt", "ethusdt"]));
        buf.ingest("btcusdt", 100.0);
        buf.ingest("btcusdt", 102.0);

        let bars = buf.close_bars("10:01");
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0], Bar::new("10:01", "btcusdt", 102.0));
    }

    #[test]
    fn carry_forward_resets_to_single_closing_price() {
        let mut buf = TickBuffers::new(&syms(&["btcusdt", "ethusdt"]));
        buf.ingest("btcusdt", 100.0);
        buf.ingest("btcusdt", 102.0);

        buf.carry_forward();
        assert_eq!(buf.len("btcusdt"), 1);
        assert_eq!(buf.latest("btcusdt"), Some(102.0));
        // A symbol with zero ticks overall stays empty.
        assert_eq!(buf.len("ethusdt"), 0);
    }
}
