//! Weighted per-horizon blend and the four reported horizons.
//!
//! Fallback chain: `1d` ← horizon 1 or last price, `1w` ← horizon 7 or `1d`,
//! `1m` ← horizon 30 or `1w`. The hourly figure scales the daily expected
//! change linearly by 1/24, a modeling assumption rather than a fitted rate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::normalizer::{normalize_forecasts, ForecastTable};
use super::weights::{compute_weights, RegimeWeightPolicy, WeightVector, WeightingMethod};
use crate::domain::{BacktestErrors, ForecastSet, Horizon, ModelName, RegimeLabel};

pub const DAY_HORIZON: Horizon = 1;
pub const WEEK_HORIZON: Horizon = 7;
pub const MONTH_HORIZON: Horizon = 30;
pub const HOURS_PER_DAY: f64 = 24.0;

/// The ensemble forecast at the four reported horizons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendedForecast {
    #[serde(rename = "1h")]
    pub one_hour: f64,
    #[serde(rename = "1d")]
    pub one_day: f64,
    #[serde(rename = "1w")]
    pub one_week: f64,
    #[serde(rename = "1m")]
    pub one_month: f64,
}

/// Blend result plus the intermediate values a report needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendOutcome {
    pub forecast: BlendedForecast,
    pub weights: WeightVector,
    pub method: WeightingMethod,
    /// Blended price for every horizon in the normalized table.
    pub by_horizon: BTreeMap<Horizon, f64>,
    /// Models that had at least one cell imputed with the last price.
    pub degraded_models: Vec<ModelName>,
}

/// Ensemble blender bound to a weight policy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Blender {
    policy: RegimeWeightPolicy,
}

impl Blender {
    pub fn new(policy: RegimeWeightPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RegimeWeightPolicy {
        &self.policy
    }

    pub fn blend(
        &self,
        forecasts: &ForecastSet,
        last_price: f64,
        regime: RegimeLabel,
        backtest_errors: Option<&BacktestErrors>,
    ) -> BlendedForecast {
        self.blend_detailed(forecasts, last_price, regime, backtest_errors)
            .forecast
    }

    pub fn blend_detailed(
        &self,
        forecasts: &ForecastSet,
        last_price: f64,
        regime: RegimeLabel,
        backtest_errors: Option<&BacktestErrors>,
    ) -> BlendOutcome {
        let table = normalize_forecasts(forecasts, last_price);
        let (weights, method) =
            compute_weights(&self.policy, table.models(), regime, backtest_errors);
        let by_horizon = blend_rows(&table, &weights);

        let one_day = by_horizon.get(&DAY_HORIZON).copied().unwrap_or(last_price);
        let one_week = by_horizon.get(&WEEK_HORIZON).copied().unwrap_or(one_day);
        let one_month = by_horizon.get(&MONTH_HORIZON).copied().unwrap_or(one_week);
        let one_hour = hourly_from_daily(last_price, one_day);

        let forecast = BlendedForecast {
            one_hour,
            one_day,
            one_week,
            one_month,
        };
        debug!(%regime, ?forecast, "blended ensemble forecast");

        BlendOutcome {
            forecast,
            weights,
            method,
            by_horizon,
            degraded_models: table.degraded_models(),
        }
    }
}

/// Blend with the default per-regime tables.
pub fn blend(
    forecasts: &ForecastSet,
    last_price: f64,
    regime: RegimeLabel,
    backtest_errors: Option<&BacktestErrors>,
) -> BlendedForecast {
    Blender::default().blend(forecasts, last_price, regime, backtest_errors)
}

/// last · (1 + (1d/last − 1) / 24). The expected change is 0 when the last
/// price is zero or non-finite.
pub fn hourly_from_daily(last_price: f64, one_day: f64) -> f64 {
    let daily_change = if last_price != 0.0 && last_price.is_finite() {
        one_day / last_price - 1.0
    } else {
        0.0
    };
    last_price * (1.0 + daily_change / HOURS_PER_DAY)
}

fn blend_rows(table: &ForecastTable, weights: &WeightVector) -> BTreeMap<Horizon, f64> {
    let column_weights: Vec<f64> = table.models().iter().map(|m| weights.get(m)).collect();
    table
        .horizons()
        .iter()
        .filter_map(|&h| {
            let row = table.row(h)?;
            let value = row.iter().zip(&column_weights).map(|(p, w)| p * w).sum();
            Some((h, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn single_model_bull_scenario() {
        let set = ForecastSet::new().with_prices("arima", [(1, 101_000.0)]);
        let out = blend(&set, 100_000.0, RegimeLabel::Bull, None);
        assert!(close(out.one_day, 101_000.0));
        assert!(close(out.one_week, 101_000.0));
        assert!(close(out.one_month, 101_000.0));
        assert!(close(out.one_hour, 100_041.666_666_666_67));
    }

    #[test]
    fn empty_forecasts_collapse_to_last_price() {
        let out = blend(&ForecastSet::new(), 50_000.0, RegimeLabel::Unknown, None);
        assert_eq!(out.one_day, 50_000.0);
        assert_eq!(out.one_week, 50_000.0);
        assert_eq!(out.one_month, 50_000.0);
        assert_eq!(out.one_hour, 50_000.0);
    }

    #[test]
    fn week_falls_back_to_day_and_month_to_week() {
        let set = ForecastSet::new().with_prices("prophet", [(1, 102.0)]);
        let out = blend(&set, 100.0, RegimeLabel::Sideways, None);
        assert_eq!(out.one_week, out.one_day);
        assert_eq!(out.one_month, out.one_week);

        let set = ForecastSet::new().with_prices("prophet", [(7, 107.0)]);
        let out = blend(&set, 100.0, RegimeLabel::Sideways, None);
        // Horizon 1 missing entirely: 1d is the last price.
        assert_eq!(out.one_day, 100.0);
        assert_eq!(out.one_week, 107.0);
        assert_eq!(out.one_month, 107.0);
    }

    #[test]
    fn two_models_weighted_by_regime() {
        // Bull: arima 0.25, prophet 0.35 → 0.25/0.6, 0.35/0.6
        let set = ForecastSet::new()
            .with_prices("arima", [(1, 100.0)])
            .with_prices("prophet", [(1, 106.0)]);
        let out = blend(&set, 100.0, RegimeLabel::Bull, None);
        let expected = 100.0 * 0.25 / 0.6 + 106.0 * 0.35 / 0.6;
        assert!(close(out.one_day, expected));
    }

    #[test]
    fn zero_last_price_keeps_hour_at_zero() {
        assert_eq!(hourly_from_daily(0.0, 101.0), 0.0);
        assert!(hourly_from_daily(f64::NAN, 101.0).is_nan());
    }

    #[test]
    fn detailed_outcome_reports_degraded_models() {
        let set = ForecastSet::new()
            .with_prices("arima", [(1, 101.0), (7, 103.0)])
            .with_failure("lstm", "diverged");
        let outcome =
            Blender::default().blend_detailed(&set, 100.0, RegimeLabel::Bear, None);
        assert_eq!(outcome.degraded_models, vec!["lstm".to_string()]);
        assert_eq!(outcome.by_horizon.len(), 2);
        assert!((outcome.weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_with_short_horizon_keys() {
        let f = BlendedForecast {
            one_hour: 1.0,
            one_day: 2.0,
            one_week: 3.0,
            one_month: 4.0,
        };
        let json = serde_json::to_value(f).unwrap();
        assert_eq!(json["1h"], 1.0);
        assert_eq!(json["1m"], 4.0);
    }
}
