//! Risk metrics: pure functions over periodic returns and price series.
//!
//! Annualization uses 365 periods per year (crypto trades every day).
//! Undefined results are `f64::NAN`, never a placeholder zero, so a caller
//! can tell "no risk" apart from "not computable". Non-finite inputs are
//! skipped.

use serde::{Deserialize, Serialize};

use crate::indicators::{log_returns, rolling_mean, rolling_std};
use crate::stats::{finite, mean, population_std, ZERO_VARIANCE_EPS};

pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Default rolling window for `rolling_risk_metrics`.
pub const DEFAULT_ROLLING_WINDOW: usize = 30;

/// The four headline metrics for one close series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub calmar: f64,
}

impl RiskMetrics {
    /// Compute all metrics from daily log returns of `closes`.
    ///
    /// `risk_free` is a per-period rate.
    pub fn from_prices(closes: &[f64], risk_free: f64) -> Self {
        let prices = finite(closes);
        let returns = log_returns(&prices);
        Self {
            sharpe: sharpe_ratio(&returns, risk_free),
            sortino: sortino_ratio(&returns, risk_free),
            max_drawdown: max_drawdown(&prices),
            calmar: calmar_ratio(&returns, &prices),
        }
    }
}

/// Annualized Sharpe ratio.
///
/// mean(r - rf) / pop_std(r - rf) · √365. NaN when empty or zero variance.
pub fn sharpe_ratio(returns: &[f64], risk_free: f64) -> f64 {
    let excess: Vec<f64> = finite(returns).iter().map(|r| r - risk_free).collect();
    if excess.is_empty() {
        return f64::NAN;
    }
    let std = population_std(&excess);
    if std < ZERO_VARIANCE_EPS {
        return f64::NAN;
    }
    mean(&excess) / std * PERIODS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio.
///
/// Denominator: population std of the negative excess returns only. NaN when
/// empty or when that deviation is zero (no losses, or a single one).
pub fn sortino_ratio(returns: &[f64], risk_free: f64) -> f64 {
    let excess: Vec<f64> = finite(returns).iter().map(|r| r - risk_free).collect();
    if excess.is_empty() {
        return f64::NAN;
    }
    let downside: Vec<f64> = excess.iter().copied().filter(|&r| r < 0.0).collect();
    let downside_std = population_std(&downside);
    if downside_std.is_nan() || downside_std < ZERO_VARIANCE_EPS {
        return f64::NAN;
    }
    mean(&excess) / downside_std * PERIODS_PER_YEAR.sqrt()
}

/// Maximum drawdown: min(price / running_max − 1). Zero or negative.
///
/// NaN for an empty series.
pub fn max_drawdown(prices: &[f64]) -> f64 {
    let prices = finite(prices);
    if prices.is_empty() {
        return f64::NAN;
    }
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for p in prices {
        peak = peak.max(p);
        let dd = p / peak - 1.0;
        if dd < worst {
            worst = dd;
        }
    }
    worst
}

/// Calmar ratio: mean(returns) · 365 / |max drawdown|.
///
/// NaN when the drawdown is zero or undefined.
pub fn calmar_ratio(returns: &[f64], prices: &[f64]) -> f64 {
    let mdd = max_drawdown(prices).abs();
    if mdd.is_nan() || mdd == 0.0 {
        return f64::NAN;
    }
    mean(&finite(returns)) * PERIODS_PER_YEAR / mdd
}

/// Rolling annualized volatility and Sharpe, index-aligned with `returns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingRisk {
    pub window: usize,
    pub volatility: Vec<f64>,
    pub sharpe: Vec<f64>,
}

impl RollingRisk {
    /// Last defined (volatility, sharpe) pair.
    pub fn latest(&self) -> Option<(f64, f64)> {
        self.volatility
            .iter()
            .zip(&self.sharpe)
            .rev()
            .find(|(v, _)| v.is_finite())
            .map(|(&v, &s)| (v, s))
    }
}

/// Rolling sample std · √365 and mean / std · √365 over `window` returns.
///
/// NaN during warmup and for windows with zero variance (Sharpe only).
pub fn rolling_risk_metrics(returns: &[f64], window: usize) -> RollingRisk {
    let ann = PERIODS_PER_YEAR.sqrt();
    let std = rolling_std(returns, window);
    let mu = rolling_mean(returns, window);

    let volatility = std.iter().map(|s| s * ann).collect();
    let sharpe = mu
        .iter()
        .zip(&std)
        .map(|(&m, &s)| {
            if s.is_nan() || s < ZERO_VARIANCE_EPS {
                f64::NAN
            } else {
                m / s * ann
            }
        })
        .collect();

    RollingRisk {
        window,
        volatility,
        sharpe,
    }
}
