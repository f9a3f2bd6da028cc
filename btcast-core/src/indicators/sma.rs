//! Simple Moving Average (SMA).
//!
//! Rolling mean of closes over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let mut sum = 0.0;
        let mut nan_in_window = false;
        for &c in closes.iter().take(self.period) {
            if c.is_nan() {
                nan_in_window = true;
            }
            sum += c;
        }

        if !nan_in_window {
            result[self.period - 1] = sum / self.period as f64;
        }

        for i in self.period..n {
            let leaving = closes[i - self.period];
            let entering = closes[i];
            sum = sum - leaving + entering;

            // A NaN anywhere in the window poisons the running sum; rescan.
            if entering.is_nan() || leaving.is_nan() || nan_in_window {
                nan_in_window = false;
                sum = 0.0;
                for &c in &closes[(i + 1 - self.period)..=i] {
                    if c.is_nan() {
                        nan_in_window = true;
                    }
                    sum += c;
                }
                if nan_in_window {
                    result[i] = f64::NAN;
                    continue;
                }
            }

            result[i] = sum / self.period as f64;
        }

        result
    }
}
