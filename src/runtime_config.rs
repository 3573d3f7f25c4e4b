// =============================================================================
// Runtime Configuration — engine settings loaded at startup
// =============================================================================
//
// Every tunable parameter lives here. All fields carry `#[serde(default)]`
// so that adding new fields never breaks loading an older config file.
// Environment variables override the file for deployment knobs (bind address,
// database path).
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_db_path() -> String {
    "trades_opt.db".to_string()
}

fn default_feed_base_url() -> String {
    "wss://stream.binance.com:9443".to_string()
}

fn default_rest_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_live_broadcast_ms() -> u64 {
    500
}

fn default_seed_limit() -> usize {
    60
}

fn default_chart_rows() -> usize {
    60
}

fn default_live_history_floor() -> usize {
    300
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the pairscope engine.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP/WebSocket server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path to the SQLite bar-history database.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Base URL for the upstream tick feed (WebSocket).
    #[serde(default = "default_feed_base_url")]
    pub feed_base_url: String,

    /// Base URL for the exchange REST API (symbol discovery, kline seeding).
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,

    /// Minimum interval between live (non-bar-close) broadcasts, in
    /// milliseconds.
    #[serde(default = "default_live_broadcast_ms")]
    pub live_broadcast_ms: u64,

    /// Number of one-minute klines fetched per symbol on cold start.
    #[serde(default = "default_seed_limit")]
    pub seed_limit: usize,

    /// Number of trailing rows sent in the initial history_batch.
    #[serde(default = "default_chart_rows")]
    pub chart_rows: usize,

    /// Floor on the per-symbol row count queried for a live recompute; the
    /// effective bound is `max(live_history_floor, 2 * window)`.
    #[serde(default = "default_live_history_floor")]
    pub live_history_floor: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            feed_base_url: default_feed_base_url(),
            rest_base_url: default_rest_base_url(),
            live_broadcast_ms: default_live_broadcast_ms(),
            seed_limit: default_seed_limit(),
            chart_rows: default_chart_rows(),
            live_history_floor: default_live_history_floor(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`, then apply environment
    /// overrides.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;
        config.apply_env_overrides();

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            db_path = %config.db_path,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Environment overrides for deployment-level knobs.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("PAIRSCOPE_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(db) = std::env::var("PAIRSCOPE_DB_PATH") {
            self.db_path = db;
        }
    }

    /// Per-symbol row bound queried for a live recompute: `max(300, 2×window)`.
    pub fn live_history_rows(&self, window: usize) -> usize {
        self.live_history_floor.max(2 * window)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.live_broadcast_ms, 500);
        assert_eq!(cfg.chart_rows, 60);
        assert_eq!(cfg.seed_limit, 60);
        assert_eq!(cfg.db_path, "trades_opt.db");
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000");
        assert_eq!(cfg.live_history_floor, 300);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "bind_addr": "127.0.0.1:9999", "chart_rows": 120 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9999");
        assert_eq!(cfg.chart_rows, 120);
        assert_eq!(cfg.seed_limit, 60);
    }

    #[test]
    fn live_history_rows_floor_and_window() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.live_history_rows(30), 300);
        assert_eq!(cfg.live_history_rows(300), 600);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.bind_addr, cfg2.bind_addr);
        assert_eq!(cfg.live_broadcast_ms, cfg2.live_broadcast_ms);
    }
}
