// =============================================================================
// Spread & z-score
// =============================================================================
//
// spread = primary − ratio·secondary, with ratio = mean(primary)/mean(secondary)
// over the full queried window. The z-score standardises the *live* spread
// against the historical spread distribution (sample standard deviation).
// Degenerate inputs resolve to 0, never NaN.

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (ddof = 1); 0 when fewer than 2 points.
pub fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (xs.len() - 1) as f64).sqrt()
}

/// Hedge ratio mean(primary)/mean(secondary). A zero secondary mean yields
/// ratio 0 (the spread degenerates to the primary series) rather than ±inf.
pub fn hedge_ratio(primary: &[f64], secondary: &[f64]) -> f64 {
    let denom = mean(secondary);
    if denom == 0.0 {
        return 0.0;
    }
    mean(primary) / denom
}

/// Element-wise spread series, truncated to the shorter input.
pub fn spread_series(primary: &[f64], secondary: &[f64], ratio: f64) -> Vec<f64> {
    primary
        .iter()
        .zip(secondary.iter())
        .map(|(p, s)| p - ratio * s)
        .collect()
}

/// Standardised deviation of `current_spread` from the historical series.
/// 0 when the series stdev is 0 or there is too little history.
pub fn z_score(current_spread: f64, history: &[f64]) -> f64 {
    let std = sample_std(history);
    if std == 0.0 {
        return 0.0;
    }
    (current_spread - mean(history)) / std
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_basics() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
        assert_eq!(sample_std(&[5.0]), 0.0);
        // Sample std of {2, 4, 4, 4, 5, 5, 7, 9} is ~2.138.
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std(&xs) - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn hedge_ratio_and_spread() {
        let p = [100.0, 102.0, 104.0];
        let s = [50.0, 51.0, 52.0];
        let ratio = hedge_ratio(&p, &s);
        assert!((ratio - 2.0).abs() < 1e-12);

        let spread = spread_series(&p, &s, ratio);
        assert_eq!(spread, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn hedge_ratio_zero_secondary_mean() {
        assert_eq!(hedge_ratio(&[1.0, 2.0], &[1.0, -1.0]), 0.0);
        assert_eq!(hedge_ratio(&[1.0], &[]), 0.0);
    }

    #[test]
    fn z_score_zero_variance_is_zero() {
        assert_eq!(z_score(5.0, &[1.0, 1.0, 1.0]), 0.0);
        assert_eq!(z_score(5.0, &[]), 0.0);
        assert_eq!(z_score(5.0, &[1.0]), 0.0);
    }

    #[test]
    fn z_score_standardises() {
        let hist = [1.0, 2.0, 3.0, 4.0, 5.0];
        // mean 3, sample std sqrt(2.5)
        let z = z_score(3.0 + (2.5f64).sqrt(), &hist);
        assert!((z - 1.0).abs() < 1e-12);
    }
}
