// =============================================================================
// Mean-reversion half-life
// =============================================================================
//
// Models the spread as a discretised mean-reverting process: regress
// Δspread[t] on spread[t−1] with a slope-only, no-intercept least-squares
// fit. A negative slope λ gives half-life = −ln(2)/λ; a non-negative slope
// (non-mean-reverting or explosive) gives 0. The result is never negative.
//
// This is a deliberate approximation carried over from the reference
// behaviour, not a statistically validated estimator.

/// Paired observations strictly required before an estimate is attempted.
const MIN_PAIRS: usize = 10;

/// Estimate the half-life of mean reversion for a spread series, in bars.
pub fn half_life(spread: &[f64]) -> f64 {
    if spread.len() < 2 {
        return 0.0;
    }

    // (lagged spread, delta) pairs over all valid positions.
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut pairs = 0usize;
    for t in 1..spread.len() {
        let lag = spread[t - 1];
        let delta = spread[t] - lag;
        sxx += lag * lag;
        sxy += lag * delta;
        pairs += 1;
    }

    if pairs <= MIN_PAIRS || sxx == 0.0 {
        return 0.0;
    }

    let slope = sxy / sxx;
    if slope < 0.0 {
        -(2.0f64.ln()) / slope
    } else {
        0.0
    }
}
