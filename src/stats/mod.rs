// =============================================================================
// Rolling Statistics Engine
// =============================================================================
//
// Turns bar history + a live price snapshot into the full StatsSnapshot
// (spread z-score, rolling correlation, rolling beta, mean-reversion
// half-life, correlation heatmap) and into derived per-row history for the
// chart view and export.
//
// Failure policy: nothing in this module returns an error. Degenerate or
// insufficient inputs resolve to documented zero-value defaults so a caller's
// broadcast cadence is never interrupted.

pub mod half_life;
pub mod heatmap;
pub mod pivot;
pub mod rolling;
pub mod spread;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::types::Bar;

use self::heatmap::Heatmap;
use self::pivot::PivotFrame;

/// One live statistics broadcast for a trading pair.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSnapshot {
    /// Clock-time label (`HH:MM`) of the broadcast.
    pub timestamp: String,
    /// Latest price per watched symbol (live tick, else last persisted bar).
    pub prices: HashMap<String, f64>,
    pub z_score: f64,
    pub rolling_corr: f64,
    pub beta: f64,
    pub half_life: f64,
    pub heatmap: Heatmap,
}

impl StatsSnapshot {
    /// Zeroed snapshot used when a recompute cycle degrades (store failure,
    /// empty history). Keeps whatever live prices are known.
    pub fn zeroed(timestamp: String, prices: HashMap<String, f64>) -> Self {
        Self {
            timestamp,
            prices,
            ..Self::default()
        }
    }

    /// The fixed degenerate snapshot for primary == secondary.
    fn identity(timestamp: String, prices: HashMap<String, f64>, symbol: &str) -> Self {
        Self {
            timestamp,
            prices,
            z_score: 0.0,
            rolling_corr: 1.0,
            beta: 1.0,
            half_life: 0.0,
            heatmap: Heatmap::identity(symbol),
        }
    }
}

/// Compute the full snapshot from bounded bar history and live prices.
///
/// `rows` is the bounded history for the watched symbol set in arrival
/// order; `prices` the live price per symbol (post-fallback). The identity
/// shortcut skips every computation.
pub fn compute_snapshot(
    timestamp: String,
    rows: &[Bar],
    prices: HashMap<String, f64>,
    primary: &str,
    secondary: &str,
    window: usize,
) -> StatsSnapshot {
    if primary == secondary {
        return StatsSnapshot::identity(timestamp, prices, primary);
    }

    let frame = PivotFrame::from_rows(rows);
    if frame.is_empty() {
        return StatsSnapshot::zeroed(timestamp, prices);
    }

    let hm = heatmap::correlation_matrix(&frame);

    let (z, corr, beta_v, hl) = match frame.aligned_pair(primary, secondary) {
        Some((p_col, s_col)) => {
            let ratio = spread::hedge_ratio(&p_col, &s_col);
            let spread_hist = spread::spread_series(&p_col, &s_col, ratio);

            let p_live = prices.get(primary).copied().unwrap_or(0.0);
            let s_live = prices.get(secondary).copied().unwrap_or(0.0);
            let current_spread = p_live - ratio * s_live;

            (
                spread::z_score(current_spread, &spread_hist),
                rolling::trailing_correlation(&p_col, &s_col, window),
                rolling::trailing_beta(&p_col, &s_col, window),
                half_life::half_life(&spread_hist),
            )
        }
        // One leg has no history at all.
        None => (0.0, 0.0, 0.0, 0.0),
    };

    StatsSnapshot {
        timestamp,
        prices,
        z_score: z,
        rolling_corr: corr,
        beta: beta_v,
        half_life: hl,
        heatmap: hm,
    }
}

/// Derived history: one flat row per pivot position, carrying the time
/// label, one price key per symbol, and the pair statistics evaluated at
/// that position (`half_life` is a whole-series constant).
///
/// Export returns these rows untruncated; the chart-view history_batch is
/// the trailing slice of the same sequence, so export is always a strict
/// superset in identical arrival order.
pub fn history_rows(rows: &[Bar], primary: &str, secondary: &str, window: usize) -> Vec<Value> {
    let frame = PivotFrame::from_rows(rows);
    let n_rows = frame.rows();
    if n_rows == 0 {
        return Vec::new();
    }

    // Pair statistics over the tail-aligned region, when both legs exist.
    // Positions before the region (or with a missing leg) stay zeroed.
    let pair = frame.aligned_pair(primary, secondary).map(|(p_col, s_col)| {
        let ratio = spread::hedge_ratio(&p_col, &s_col);
        let spread_hist = spread::spread_series(&p_col, &s_col, ratio);
        let m = spread::mean(&spread_hist);
        let std = spread::sample_std(&spread_hist);
        let z: Vec<f64> = spread_hist
            .iter()
            .map(|s| if std == 0.0 { 0.0 } else { (s - m) / std })
            .collect();
        let corr = rolling::rolling_correlation_series(&p_col, &s_col, window);
        let betas = rolling::rolling_beta_series(&p_col, &s_col, window);
        let hl = half_life::half_life(&spread_hist);
        let offset = frame.pair_offset(primary, secondary).unwrap_or(0);
        (offset, z, corr, betas, hl)
    });

    (0..n_rows)
        .map(|row| {
            let mut obj = Map::new();
            obj.insert(
                "timestamp".to_string(),
                json!(frame.label_at(row).unwrap_or_default()),
            );
            for symbol in frame.columns() {
                if let Some(px) = frame.value_at(symbol, row) {
                    obj.insert(symbol.clone(), json!(px));
                }
            }

            let (z, corr, beta_v, hl) = match &pair {
                Some((offset, z, corr, betas, hl)) => match row.checked_sub(*offset) {
                    Some(i) if i < z.len() => (z[i], corr[i], betas[i], *hl),
                    _ => (0.0, 0.0, 0.0, 0.0),
                },
                None => (0.0, 0.0, 0.0, 0.0),
            };
            obj.insert("z_score".to_string(), json!(z));
            obj.insert("rolling_corr".to_string(), json!(corr));
            obj.insert("beta".to_string(), json!(beta_v));
            obj.insert("half_life".to_string(), json!(hl));
            Value::Object(obj)
        })
        .collect()
}
