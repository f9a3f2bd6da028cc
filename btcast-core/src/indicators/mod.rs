//! Technical indicators over daily close series.
//!
//! Indicators are pure functions: close series in, series of the same length
//! out. The first `lookback()` values are `f64::NAN` (warmup). No value at
//! index t depends on closes after t.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volatility;

pub use ema::ema_of_series;
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use sma::Sma;
pub use volatility::{log_returns, rolling_mean, rolling_std};

/// Trait for single-series indicators.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_200", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading NaN values before the indicator produces output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole close series.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;

    /// Value at the last index, if defined.
    fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.compute(closes).last().copied().filter(|v| !v.is_nan())
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
