//! Moving Average Convergence/Divergence (MACD).
//!
//! MACD line = EMA(fast) - EMA(slow); signal = EMA(signal_span) of the MACD
//! line; histogram = MACD - signal. All three series are defined from the
//! first close because the underlying EMA is seeded with the first value.

use serde::{Deserialize, Serialize};

use super::ema::ema_of_series;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// The three MACD output series, each the length of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(fast < slow, "MACD fast span must be shorter than slow span");
        Self { fast, slow, signal }
    }

    pub fn compute(&self, closes: &[f64]) -> MacdSeries {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&macd, self.signal);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
        MacdSeries {
            macd,
            signal,
            histogram,
        }
    }
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// True when MACD was at or above signal on the previous bar and is below
    /// it on the last bar.
    pub fn bearish_cross_at_end(&self) -> bool {
        let n = self.len();
        if n < 2 {
            return false;
        }
        let (prev_m, prev_s) = (self.macd[n - 2], self.signal[n - 2]);
        let (last_m, last_s) = (self.macd[n - 1], self.signal[n - 1]);
        last_m < last_s && prev_m >= prev_s
    }
}
