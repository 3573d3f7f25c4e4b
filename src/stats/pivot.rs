// =============================================================================
// Arrival-order pivot — reshape bar rows into aligned per-symbol columns
// =============================================================================
//
// Columns are right-aligned: row index counts forward in arrival order and
// the newest bar of every symbol sits in the last row. The i-th-from-the-end
// bar of every series is treated as simultaneous; true wall-clock alignment
// is not verified. Series with gaps simply start later in the frame.

use std::collections::HashMap;

use crate::types::Bar;

/// Per-symbol price columns indexed by arrival-sequence position.
#[derive(Debug, Clone, Default)]
pub struct PivotFrame {
    /// Column order = first-seen order of symbols in the input rows.
    columns: Vec<String>,
    prices: HashMap<String, Vec<f64>>,
    labels: HashMap<String, Vec<String>>,
}

impl PivotFrame {
    pub fn from_rows(rows: &[Bar]) -> Self {
        let mut frame = Self::default();
        for bar in rows {
            if !frame.prices.contains_key(&bar.symbol) {
                frame.columns.push(bar.symbol.clone());
            }
            frame
                .prices
                .entry(bar.symbol.clone())
                .or_default()
                .push(bar.price);
            frame
                .labels
                .entry(bar.symbol.clone())
                .or_default()
                .push(bar.timestamp.clone());
        }
        frame
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows in the frame (length of the longest column).
    pub fn rows(&self) -> usize {
        self.prices.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Price of `symbol` at frame row `row`, honouring right-alignment.
    pub fn value_at(&self, symbol: &str, row: usize) -> Option<f64> {
        let col = self.prices.get(symbol)?;
        let offset = self.rows() - col.len();
        row.checked_sub(offset).and_then(|i| col.get(i)).copied()
    }

    /// Time label for frame row `row`: taken from the first column that has
    /// a bar at that row. Bars committed in one batch share a label, so in
    /// steady state every column agrees.
    pub fn label_at(&self, row: usize) -> Option<&str> {
        let rows = self.rows();
        for symbol in &self.columns {
            let labels = &self.labels[symbol];
            let offset = rows - labels.len();
            if let Some(i) = row.checked_sub(offset) {
                if let Some(label) = labels.get(i) {
                    return Some(label);
                }
            }
        }
        None
    }

    /// Tail-aligned pair of price columns: the trailing `min(len_a, len_b)`
    /// observations of each, newest last. For `a == b` both halves are the
    /// same column. `None` when either column is absent.
    pub fn aligned_pair(&self, a: &str, b: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        let ca = self.prices.get(a)?;
        let cb = self.prices.get(b)?;
        let n = ca.len().min(cb.len());
        Some((
            ca[ca.len() - n..].to_vec(),
            cb[cb.len() - n..].to_vec(),
        ))
    }

    /// Frame row index where the aligned (a, b) region starts.
    pub fn pair_offset(&self, a: &str, b: &str) -> Option<usize> {
        let ca = self.prices.get(a)?;
        let cb = self.prices.get(b)?;
        let n = ca.len().min(cb.len());
        Some(self.rows() - n)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rows: &[(&str, &str, f64)]) -> PivotFrame {
        let bars: Vec<Bar> = rows
            .iter()
            .map(|(ts, sym, px)| Bar::new(*ts, *sym, *px))
            .collect();
        PivotFrame::from_rows(&bars)
    }

    #[test]
    fn columns_in_first_seen_order() {
        let f = frame(&[
            ("10:00", "btcusdt", 100.0),
            ("10:00", "ethusdt", 10.0),
            ("10:01", "btcusdt", 101.0),
        ]);
        assert_eq!(f.columns(), &["btcusdt", "ethusdt"]);
        assert_eq!(f.value_at("btcusdt", 0), Some(100.0));
        assert_eq!(f.value_at("btcusdt", 1), Some(101.0));
        assert_eq!(f.rows(), 2);
    }

    #[test]
    fn gapped_series_right_aligns() {
        // ethusdt missed the first bar; its only bar is the newest row.
        let f = frame(&[
            ("10:00", "btcusdt", 100.0),
            ("10:01", "btcusdt", 101.0),
            ("10:01", "ethusdt", 10.0),
        ]);
        assert_eq!(f.value_at("ethusdt", 0), None);
        assert_eq!(f.value_at("ethusdt", 1), Some(10.0));
        assert_eq!(f.value_at("btcusdt", 1), Some(101.0));
        assert_eq!(f.label_at(0), Some("10:00"));
        assert_eq!(f.label_at(1), Some("10:01"));
    }

    #[test]
    fn aligned_pair_takes_trailing_min_length() {
        let f = frame(&[
            ("10:00", "btcusdt", 100.0),
            ("10:01", "btcusdt", 101.0),
            ("10:02", "btcusdt", 102.0),
            ("10:01", "ethusdt", 10.0),
            ("10:02", "ethusdt", 11.0),
        ]);
        let (p, s) = f.aligned_pair("btcusdt", "ethusdt").unwrap();
        assert_eq!(p, vec![101.0, 102.0]);
        assert_eq!(s, vec![10.0, 11.0]);
        assert_eq!(f.pair_offset("btcusdt", "ethusdt"), Some(1));
    }

    #[test]
    fn aligned_pair_identity_and_missing() {
        let f = frame(&[("10:00", "btcusdt", 100.0)]);
        let (a, b) = f.aligned_pair("btcusdt", "btcusdt").unwrap();
        assert_eq!(a, b);
        assert!(f.aligned_pair("btcusdt", "solusdt").is_none());
    }

    #[test]
    fn empty_frame() {
        let f = PivotFrame::from_rows(&[]);
        assert!(f.is_empty());
        assert_eq!(f.rows(), 0);
        assert_eq!(f.label_at(0), None);
    }
}
