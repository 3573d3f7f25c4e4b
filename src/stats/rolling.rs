// =============================================================================
// Rolling window correlation & beta
// =============================================================================
//
// Both statistics are evaluated over the trailing `window` observations. When
// fewer than `window` points exist, or a window is degenerate (zero variance),
// the value is 0 — never NaN or an error.

/// Pearson correlation of two equal-length slices.
/// `None` when either side has zero variance (including constant series).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Rolling Pearson correlation at the latest position.
pub fn trailing_correlation(x: &[f64], y: &[f64], window: usize) -> f64 {
    let n = x.len().min(y.len());
    if window < 2 || n < window {
        return 0.0;
    }
    pearson(&x[n - window..n], &y[n - window..n]).unwrap_or(0.0)
}

/// Rolling beta cov(x, y)/var(y) at the latest position.
pub fn trailing_beta(x: &[f64], y: &[f64], window: usize) -> f64 {
    let n = x.len().min(y.len());
    if window < 2 || n < window {
        return 0.0;
    }
    beta(&x[n - window..n], &y[n - window..n])
}

/// Rolling correlation evaluated at every position: element `i` covers the
/// window ending at `i` inclusive, 0 while the window is still filling.
pub fn rolling_correlation_series(x: &[f64], y: &[f64], window: usize) -> Vec<f64> {
    let n = x.len().min(y.len());
    (0..n)
        .map(|i| {
            if window < 2 || i + 1 < window {
                0.0
            } else {
                pearson(&x[i + 1 - window..=i], &y[i + 1 - window..=i]).unwrap_or(0.0)
            }
        })
        .collect()
}

/// Rolling beta evaluated at every position, same windowing as
/// [`rolling_correlation_series`].
pub fn rolling_beta_series(x: &[f64], y: &[f64], window: usize) -> Vec<f64> {
    let n = x.len().min(y.len());
    (0..n)
        .map(|i| {
            if window < 2 || i + 1 < window {
                0.0
            } else {
                beta(&x[i + 1 - window..=i], &y[i + 1 - window..=i])
            }
        })
        .collect()
}

fn beta(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        cov += (x[i] - mx) * (y[i] - my);
        var_y += (y[i] - my).powi(2);
    }
    if var_y == 0.0 {
        return 0.0;
    }
    cov / var_y
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_positive_and_negative_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((trailing_correlation(&x, &y, 5) - 1.0).abs() < 1e-12);

        let neg: Vec<f64> = y.iter().map(|v| -v).collect();
        assert!((trailing_correlation(&x, &neg, 5) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_stays_in_unit_interval() {
        let x = [1.0, 3.0, 2.0, 5.0, 4.0, 7.0, 6.0, 9.0];
        let y = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 8.0, 7.0];
        let c = trailing_correlation(&x, &y, 8);
        assert!((-1.0..=1.0).contains(&c));
        assert!(c != 0.0);
    }

    #[test]
    fn constant_series_gives_zero_not_nan() {
        let flat = [3.0; 10];
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let c = trailing_correlation(&x, &flat, 10);
        assert_eq!(c, 0.0);
        assert!(!c.is_nan());
        assert_eq!(trailing_beta(&x, &flat, 10), 0.0);
    }

    #[test]
    fn insufficient_window_gives_zero() {
        let x = [1.0, 2.0, 3.0];
        let y = [2.0, 4.0, 6.0];
        assert_eq!(trailing_correlation(&x, &y, 5), 0.0);
        assert_eq!(trailing_beta(&x, &y, 5), 0.0);
    }

    #[test]
    fn beta_recovers_linear_slope() {
        // x = 3·y + noiseless offset over the window => beta 3.
        let y = [10.0, 11.0, 12.0, 13.0, 14.0];
        let x: Vec<f64> = y.iter().map(|v| 3.0 * v + 7.0).collect();
        assert!((trailing_beta(&x, &y, 5) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn rolling_series_fill_and_latest_agree() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let series = rolling_correlation_series(&x, &y, 3);
        assert_eq!(series.len(), 6);
        assert_eq!(series[0], 0.0);
        assert_eq!(series[1], 0.0);
        for v in &series[2..] {
            assert!((v - 1.0).abs() < 1e-12);
        }
        assert_eq!(*series.last().unwrap(), trailing_correlation(&x, &y, 3));

        let betas = rolling_beta_series(&x, &y, 3);
        assert_eq!(*betas.last().unwrap(), trailing_beta(&x, &y, 3));
    }
}
