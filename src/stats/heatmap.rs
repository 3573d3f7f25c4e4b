// =============================================================================
// Cross-symbol correlation heatmap
// =============================================================================
//
// Pairwise Pearson correlation across up to the first 10 pivot columns over
// the bounded window. Undefined entries (constant or too-short series) are
// replaced by 0, including the diagonal of a constant column.

use serde::Serialize;

use crate::stats::pivot::PivotFrame;
use crate::stats::rolling::pearson;

/// Symbols included in the heatmap are capped to the first pivot columns.
const MAX_HEATMAP_SYMBOLS: usize = 10;

/// Plot-ready correlation matrix: `z[i][j]` = corr(x[i], y[j]).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Heatmap {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<f64>>,
}

impl Heatmap {
    /// The fixed 1×1 identity heatmap for the primary == secondary case.
    pub fn identity(symbol: &str) -> Self {
        Self {
            x: vec![symbol.to_string()],
            y: vec![symbol.to_string()],
            z: vec![vec![1.0]],
        }
    }
}

/// Correlation matrix over the first [`MAX_HEATMAP_SYMBOLS`] pivot columns.
/// Each pair is tail-aligned before correlating; undefined entries become 0.
pub fn correlation_matrix(frame: &PivotFrame) -> Heatmap {
    let symbols: Vec<String> = frame
        .columns()
        .iter()
        .take(MAX_HEATMAP_SYMBOLS)
        .cloned()
        .collect();

    let z = symbols
        .iter()
        .map(|a| {
            symbols
                .iter()
                .map(|b| {
                    frame
                        .aligned_pair(a, b)
                        .and_then(|(ca, cb)| pearson(&ca, &cb))
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    Heatmap {
        x: symbols.clone(),
        y: symbols,
        z,
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;

    fn frame(rows: &[(&str, f64)]) -> PivotFrame {
        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, (sym, px))| Bar::new(format!("10:{:02}", i % 60), *sym, *px))
            .collect();
        PivotFrame::from_rows(&bars)
    }

    #[test]
    fn two_correlated_symbols() {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(("btcusdt", 100.0 + i as f64));
            rows.push(("ethusdt", 10.0 + 2.0 * i as f64));
        }
        let hm = correlation_matrix(&frame(&rows));
        assert_eq!(hm.x, vec!["btcusdt", "ethusdt"]);
        assert_eq!(hm.z.len(), 2);
        assert!((hm.z[0][0] - 1.0).abs() < 1e-12);
        assert!((hm.z[0][1] - 1.0).abs() < 1e-9);
        assert!((hm.z[1][0] - hm.z[0][1]).abs() < 1e-12);
    }

    #[test]
    fn constant_column_entries_are_zero() {
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push(("btcusdt", 100.0 + i as f64));
            rows.push(("flatusdt", 5.0));
        }
        let hm = correlation_matrix(&frame(&rows));
        // Every entry touching the constant column is undefined -> 0,
        // including its own diagonal.
        assert_eq!(hm.z[0][1], 0.0);
        assert_eq!(hm.z[1][0], 0.0);
        assert_eq!(hm.z[1][1], 0.0);
        assert!((hm.z[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn caps_at_ten_symbols() {
        let mut rows = Vec::new();
        for s in 0..14 {
            let name = format!("sym{s}usdt");
            for i in 0..5 {
                rows.push((name.clone(), (s * 10 + i) as f64));
            }
        }
        let bars: Vec<Bar> = rows
            .iter()
            .map(|(sym, px)| Bar::new("10:00", sym.clone(), *px))
            .collect();
        let hm = correlation_matrix(&PivotFrame::from_rows(&bars));
        assert_eq!(hm.x.len(), 10);
        assert_eq!(hm.z.len(), 10);
        assert_eq!(hm.z[0].len(), 10);
    }

    #[test]
    fn empty_frame_gives_empty_heatmap() {
        let hm = correlation_matrix(&PivotFrame::from_rows(&[]));
        assert!(hm.x.is_empty());
        assert!(hm.z.is_empty());
    }
}
