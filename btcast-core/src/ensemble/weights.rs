//! Model weighting: static per-regime tables or inverse backtest error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::domain::{
    BacktestErrors, ModelName, RegimeLabel, ARIMA, HMM, LSTM, MONTE_CARLO, PROPHET,
};

/// Static weight distribution over the canonical models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegimeWeightTable {
    pub arima: f64,
    pub prophet: f64,
    pub lstm: f64,
    pub hmm: f64,
    pub mc: f64,
}

impl RegimeWeightTable {
    /// Trend-following models lead in a bull market.
    pub const BULL: Self = Self {
        arima: 0.25,
        prophet: 0.35,
        lstm: 0.25,
        hmm: 0.05,
        mc: 0.10,
    };

    /// Regime and distribution models gain weight in a bear market.
    pub const BEAR: Self = Self {
        arima: 0.25,
        prophet: 0.20,
        lstm: 0.15,
        hmm: 0.20,
        mc: 0.20,
    };

    /// Also used for `unknown`.
    pub const SIDEWAYS: Self = Self {
        arima: 0.30,
        prophet: 0.25,
        lstm: 0.20,
        hmm: 0.10,
        mc: 0.15,
    };

    /// Weight for a model name; 0 for anything outside the canonical set.
    pub fn weight_for(&self, model: &str) -> f64 {
        self.entries()
            .iter()
            .find(|(name, _)| *name == model)
            .map_or(0.0, |&(_, w)| w)
    }

    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            (ARIMA, self.arima),
            (PROPHET, self.prophet),
            (LSTM, self.lstm),
            (HMM, self.hmm),
            (MONTE_CARLO, self.mc),
        ]
    }

    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }
}

/// Regime → weight table mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeWeightPolicy {
    pub bull: RegimeWeightTable,
    pub bear: RegimeWeightTable,
    pub sideways: RegimeWeightTable,
}

impl Default for RegimeWeightPolicy {
    fn default() -> Self {
        Self {
            bull: RegimeWeightTable::BULL,
            bear: RegimeWeightTable::BEAR,
            sideways: RegimeWeightTable::SIDEWAYS,
        }
    }
}

impl RegimeWeightPolicy {
    pub fn table_for(&self, regime: RegimeLabel) -> &RegimeWeightTable {
        match regime {
            RegimeLabel::Bull => &self.bull,
            RegimeLabel::Bear => &self.bear,
            RegimeLabel::Sideways | RegimeLabel::Unknown => &self.sideways,
        }
    }
}

/// Which path produced a weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightingMethod {
    RegimeTable { regime: RegimeLabel },
    InverseError,
}

/// Model → weight over the columns of a normalized table.
///
/// Weights are non-negative and sum to 1, or are all zero when no column
/// received positive weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<ModelName, f64>);

impl WeightVector {
    /// Weight for `model`; 0 if absent.
    pub fn get(&self, model: &str) -> f64 {
        self.0.get(model).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// (1/e_i) / Σ(1/e_j) over models with a positive finite error.
///
/// Zero, negative and non-finite errors get weight 0. Each inverse is taken
/// relative to the smallest valid error so a subnormal MAE cannot overflow
/// the total.
pub fn inverse_error_weights(errors: &BacktestErrors) -> BTreeMap<ModelName, f64> {
    let valid = |e: f64| e.is_finite() && e > 0.0;
    let Some(min_error) = errors
        .values()
        .copied()
        .filter(|&e| valid(e))
        .min_by(f64::total_cmp)
    else {
        return errors.keys().map(|m| (m.clone(), 0.0)).collect();
    };

    let relative: BTreeMap<ModelName, f64> = errors
        .iter()
        .map(|(model, &e)| {
            let w = if valid(e) { min_error / e } else { 0.0 };
            (model.clone(), w)
        })
        .collect();
    // min_error / min_error == 1, so the total is at least 1.
    let total: f64 = relative.values().sum();
    relative.into_iter().map(|(m, w)| (m, w / total)).collect()
}

/// Weights for the given table columns.
///
/// Any supplied backtest error switches to inverse-error weighting. Raw
/// weights are then re-normalized over exactly `models`; a zero total falls
/// back to a divisor of 1.
pub fn compute_weights(
    policy: &RegimeWeightPolicy,
    models: &[ModelName],
    regime: RegimeLabel,
    backtest_errors: Option<&BacktestErrors>,
) -> (WeightVector, WeightingMethod) {
    let (raw, method): (Vec<f64>, WeightingMethod) = match backtest_errors {
        Some(errors) if !errors.is_empty() => {
            let inv = inverse_error_weights(errors);
            let raw = models
                .iter()
                .map(|m| inv.get(m).copied().unwrap_or(0.0))
                .collect();
            (raw, WeightingMethod::InverseError)
        }
        _ => {
            let table = policy.table_for(regime);
            let raw = models.iter().map(|m| table.weight_for(m)).collect();
            (raw, WeightingMethod::RegimeTable { regime })
        }
    };

    let raw: Vec<f64> = raw
        .into_iter()
        .map(|w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();
    let total: f64 = raw.iter().sum();
    let divisor = if total > 0.0 {
        total
    } else {
        if !models.is_empty() {
            warn!(?method, "no model received positive weight; blend collapses to zero");
        }
        1.0
    };

    let weights: BTreeMap<ModelName, f64> = models
        .iter()
        .cloned()
        .zip(raw.into_iter().map(|w| w / divisor))
        .collect();
    debug!(?method, ?weights, "computed ensemble weights");

    (WeightVector(weights), method)
}
