//! Relative Strength Index (RSI) with recursive exponential smoothing.
//!
//! avg[t] = a * x[t] + (1 - a) * avg[t-1], a = 1 / period, applied separately
//! to gains and losses. Both averages start at the first change (index 1)
//! rather than at an average of the first `period` changes, and the RSI is
//! defined once `period` changes have been seen.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge case: avg_loss == 0 (no losses yet, or a flat series) reads as a
//! neutral 50, not 100.

use super::Indicator;

const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let alpha = 1.0 / self.period as f64;
        let mut averages: Option<(f64, f64)> = None;
        for i in 1..n {
            let change = closes[i] - closes[i - 1];
            // A gap poisons the recursion from here on.
            if change.is_nan() {
                return result;
            }
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            let (avg_gain, avg_loss) = match averages {
                None => (gain, loss),
                Some((g, l)) => (
                    alpha * gain + (1.0 - alpha) * g,
                    alpha * loss + (1.0 - alpha) * l,
                ),
            };
            averages = Some((avg_gain, avg_loss));

            if i >= self.period {
                result[i] = rsi_from_averages(avg_gain, avg_loss);
            }
        }

        result
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        NEUTRAL_RSI
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
