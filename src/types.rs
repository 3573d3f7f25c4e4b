// =============================================================================
// Shared types used across the pairscope engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single trade tick from the upstream feed. Transient — never persisted.
///
/// `symbol` is always canonical lower-case.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
}

/// One aggregated closing price for a symbol over one minute interval.
///
/// `timestamp` is a clock-time label (`HH:MM`), not a unique epoch key; the
/// SQLite `rowid` is the only total order across a symbol's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: String,
    pub symbol: String,
    pub price: f64,
}

impl Bar {
    pub fn new(timestamp: impl Into<String>, symbol: impl Into<String>, price: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            symbol: symbol.into(),
            price,
        }
    }
}

/// Validated subscription parameters for one subscriber session.
///
/// `symbols` is the full watched set (watchlist ∪ {primary, secondary}),
/// lower-cased and deduplicated in first-seen order. `window >= 2` always.
#[derive(Debug, Clone)]
pub struct SubscribeParams {
    pub symbols: Vec<String>,
    pub primary: String,
    pub secondary: String,
    pub window: usize,
}

impl SubscribeParams {
    /// Normalise raw query inputs: lower-case everything, merge the trading
    /// pair into the watched set, clamp the window to the minimum of 2.
    pub fn normalise(
        watchlist: &str,
        primary: &str,
        secondary: &str,
        window: usize,
    ) -> Self {
        let primary = primary.trim().to_lowercase();
        let secondary = secondary.trim().to_lowercase();

        let mut symbols: Vec<String> = Vec::new();
        let push_unique = |s: String, symbols: &mut Vec<String>| {
            if !s.is_empty() && !symbols.contains(&s) {
                symbols.push(s);
            }
        };

        for raw in watchlist.split(',') {
            push_unique(raw.trim().to_lowercase(), &mut symbols);
        }
        push_unique(primary.clone(), &mut symbols);
        push_unique(secondary.clone(), &mut symbols);

        Self {
            symbols,
            primary,
            secondary,
            window: window.max(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_lowercases_and_dedupes() {
        let p = SubscribeParams::normalise("BTCUSDT, ethusdt", "BTCUSDT", "solusdt", 30);
        assert_eq!(p.symbols, vec!["btcusdt", "ethusdt", "solusdt"]);
        assert_eq!(p.primary, "btcusdt");
        assert_eq!(p.secondary, "solusdt");
        assert_eq!(p.window, 30);
    }

    #[test]
    fn normalise_clamps_window() {
        let p = SubscribeParams::normalise("", "btcusdt", "ethusdt", 0);
        assert_eq!(p.window, 2);
        assert_eq!(p.symbols, vec!["btcusdt", "ethusdt"]);
    }

    #[test]
    fn normalise_identity_pair_single_symbol() {
        let p = SubscribeParams::normalise("", "btcusdt", "btcusdt", 15);
        assert_eq!(p.symbols, vec!["btcusdt"]);
    }
}
