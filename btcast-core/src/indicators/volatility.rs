//! Return and rolling-dispersion helpers.
//!
//! `log_returns` has one fewer element than its input. The rolling helpers
//! keep input length and emit NaN until the window is full or while any NaN
//! sits inside the window.

use crate::stats::{mean, sample_std};

/// ln(p[t] / p[t-1]) for each consecutive pair.
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Rolling arithmetic mean over `window` values.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, 1, mean)
}

/// Rolling sample standard deviation (ddof = 1) over `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, 2, sample_std)
}

fn rolling(values: &[f64], window: usize, min_window: usize, f: fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window < min_window || n < window {
        return result;
    }
    for end in window..=n {
        let slice = &values[end - window..end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[end - 1] = f(slice);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn log_returns_basic() {
        let r = log_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_approx(r[0], (1.1f64).ln(), DEFAULT_EPSILON);
        assert_approx(r[1], (0.9f64).ln(), DEFAULT_EPSILON);
    }

    #[test]
    fn log_returns_short_input() {
        assert!(log_returns(&[]).is_empty());
        assert!(log_returns(&[100.0]).is_empty());
    }

    #[test]
    fn rolling_mean_warmup_and_values() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(out[0].is_nan());
        assert_approx(out[1], 1.5, DEFAULT_EPSILON);
        assert_approx(out[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_is_sample_std() {
        // [2, 4, 4, 4, 5, 5, 7, 9]: sum of squared deviations = 32, n - 1 = 7
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_std(&v, 8);
        assert!(out[6].is_nan());
        assert_approx(out[7], (32.0f64 / 7.0).sqrt(), 1e-12);
    }

    #[test]
    fn rolling_std_skips_windows_with_nan() {
        let out = rolling_std(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_approx(out[3], (0.5f64).sqrt(), 1e-12);
    }

    #[test]
    fn rolling_window_larger_than_input() {
        assert!(rolling_std(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert!(rolling_std(&[1.0, 2.0], 1).iter().all(|v| v.is_nan()));
    }
}
