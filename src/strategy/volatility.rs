//! Return and rolling volatility helpers
//!
//! Percentage returns: r_t = close_t / close_{t-1} - 1
//! Rolling volatility: sample standard deviation (n - 1) of each window of
//! consecutive returns. Leading positions without a full window are omitted.

use statrs::statistics::Statistics;

/// Period-over-period percentage returns, one shorter than the input.
/// A return touching a missing close is NaN.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (pair[0], pair[1]);
            if prev.is_finite() && curr.is_finite() {
                curr / prev - 1.0
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Rolling sample standard deviation over `window` consecutive values.
///
/// Output entry `i` covers `values[i..i + window]`; any NaN inside a window
/// makes that entry NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    values
        .windows(window)
        .map(|w| {
            if w.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                w.iter().std_dev()
            }
        })
        .collect()
}
