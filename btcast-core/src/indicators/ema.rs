//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: EMA[0] = x[0], so the series is defined from the first observation
//! (the non-adjusted recursive form). Lookback: 0.
//!
//! Building block for MACD.

/// EMA over an arbitrary series (closes, or the MACD line for the signal).
///
/// A NaN input taints every later value.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    result[0] = prev;
    for i in 1..n {
        if values[i].is_nan() || prev.is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_span_1_equals_input() {
        let result = ema_of_series(&[100.0, 200.0, 300.0], 1);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seed = 10
        // EMA[1] = 0.5*11 + 0.5*10 = 10.5
        // EMA[2] = 0.5*12 + 0.5*10.5 = 11.25
        let result = ema_of_series(&[10.0, 11.0, 12.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_propagates() {
        let result = ema_of_series(&[10.0, 11.0, f64::NAN, 13.0], 3);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn ema_has_no_lookahead() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.4).cos() * 3.0).collect();
        let full = ema_of_series(&values, 12);
        let truncated = ema_of_series(&values[..40], 12);
        for i in 0..40 {
            assert_approx(full[i], truncated[i], 1e-12);
        }
    }

    #[test]
    fn ema_empty() {
        assert!(ema_of_series(&[], 12).is_empty());
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let result = ema_of_series(&[50.0; 40], 26);
        assert!(result.iter().all(|&v| (v - 50.0).abs() < DEFAULT_EPSILON));
    }
}
