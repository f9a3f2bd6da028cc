//! Per-model forecast outputs and the ForecastSet container.
//!
//! A model's output is either a horizon→price map or an explicit failure.
//! Inside a map, `None` marks a horizon the model could not price. Both are
//! imputed by the normalizer, never read as real prices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model identifier (e.g. "arima", "prophet", "lstm").
pub type ModelName = String;

/// Forecast horizon in days ahead. Zero is not a forecast horizon.
pub type Horizon = u32;

/// Optional per-model mean absolute error from an external backtest.
pub type BacktestErrors = BTreeMap<ModelName, f64>;

/// Output contract of one forecasting model.
///
/// On the wire: `{"status": "ok", "horizons": {"1": 101000.0}}` or
/// `{"status": "failed", "reason": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModelForecastRecord", into = "ModelForecastRecord")]
pub enum ModelForecast {
    /// The model fit; some horizons may still be unpriced (`None`).
    Available {
        horizons: BTreeMap<Horizon, Option<f64>>,
    },
    /// The model failed to fit.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ForecastStatus {
    Ok,
    Failed,
}

// Flat record so integer horizon keys deserialize without going through
// serde's buffered internally-tagged path.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelForecastRecord {
    status: ForecastStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    horizons: Option<BTreeMap<Horizon, Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl From<ModelForecastRecord> for ModelForecast {
    fn from(record: ModelForecastRecord) -> Self {
        match record.status {
            ForecastStatus::Ok => ModelForecast::Available {
                horizons: record.horizons.unwrap_or_default(),
            },
            ForecastStatus::Failed => ModelForecast::Unavailable {
                reason: record.reason.unwrap_or_else(|| "unspecified failure".into()),
            },
        }
    }
}

impl From<ModelForecast> for ModelForecastRecord {
    fn from(forecast: ModelForecast) -> Self {
        match forecast {
            ModelForecast::Available { horizons } => ModelForecastRecord {
                status: ForecastStatus::Ok,
                horizons: Some(horizons),
                reason: None,
            },
            ModelForecast::Unavailable { reason } => ModelForecastRecord {
                status: ForecastStatus::Failed,
                horizons: None,
                reason: Some(reason),
            },
        }
    }
}

impl ModelForecast {
    /// Build an available forecast from (horizon, price) pairs.
    ///
    /// Non-finite prices are stored as `None` so a NaN from an upstream
    /// model can never be mistaken for a computed price.
    pub fn from_prices(prices: impl IntoIterator<Item = (Horizon, f64)>) -> Self {
        let horizons = prices
            .into_iter()
            .map(|(h, p)| (h, if p.is_finite() { Some(p) } else { None }))
            .collect();
        ModelForecast::Available { horizons }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelForecast::Unavailable {
            reason: reason.into(),
        }
    }

    /// Finite price at `horizon`, if the model produced one.
    pub fn price_at(&self, horizon: Horizon) -> Option<f64> {
        match self {
            ModelForecast::Available { horizons } => horizons
                .get(&horizon)
                .copied()
                .flatten()
                .filter(|p| p.is_finite()),
            ModelForecast::Unavailable { .. } => None,
        }
    }

    /// Horizons this model declares (priced or not). Empty when unavailable.
    pub fn horizons(&self) -> impl Iterator<Item = Horizon> + '_ {
        let keys = match self {
            ModelForecast::Available { horizons } => Some(horizons.keys().copied()),
            ModelForecast::Unavailable { .. } => None,
        };
        keys.into_iter().flatten().filter(|&h| h > 0)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ModelForecast::Available { .. })
    }
}

/// Model name → model output.
///
/// Keyed containers guarantee one entry per model and one price per
/// (model, horizon).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastSet {
    models: BTreeMap<ModelName, ModelForecast>,
}

impl ForecastSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: impl Into<ModelName>, forecast: ModelForecast) {
        self.models.insert(model.into(), forecast);
    }

    /// Builder-style insert of an available forecast.
    pub fn with_prices(
        mut self,
        model: impl Into<ModelName>,
        prices: impl IntoIterator<Item = (Horizon, f64)>,
    ) -> Self {
        self.insert(model, ModelForecast::from_prices(prices));
        self
    }

    /// Builder-style insert of a failed model.
    pub fn with_failure(mut self, model: impl Into<ModelName>, reason: impl Into<String>) -> Self {
        self.insert(model, ModelForecast::unavailable(reason));
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelForecast> {
        self.models.get(model)
    }

    /// Model names in ascending order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelForecast)> {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sorted union of every horizon declared by any model.
    pub fn horizons(&self) -> Vec<Horizon> {
        let mut all: Vec<Horizon> = self.models.values().flat_map(|m| m.horizons()).collect();
        all.sort_unstable();
        all.dedup();
        all
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromIterator<(ModelName, ModelForecast)> for ForecastSet {
    fn from_iter<T: IntoIterator<Item = (ModelName, ModelForecast)>>(iter: T) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_prices_become_missing() {
        let f = ModelForecast::from_prices([(1, f64::NAN), (7, 105.0)]);
        assert_eq!(f.price_at(1), None);
        assert_eq!(f.price_at(7), Some(105.0));
        assert_eq!(f.price_at(30), None);
    }

    #[test]
    fn horizon_union_is_sorted_and_unique() {
        let set = ForecastSet::new()
            .with_prices("arima", [(30, 1.0), (1, 1.0), (7, 1.0)])
            .with_prices("prophet", [(7, 1.0), (14, 1.0)])
            .with_failure("lstm", "fit diverged");
        assert_eq!(set.horizons(), vec![1, 7, 14, 30]);
    }

    #[test]
    fn zero_horizon_is_ignored() {
        let set = ForecastSet::new().with_prices("arima", [(0, 1.0), (1, 2.0)]);
        assert_eq!(set.horizons(), vec![1]);
    }

    #[test]
    fn unavailable_declares_no_horizons() {
        let f = ModelForecast::unavailable("no data");
        assert_eq!(f.horizons().count(), 0);
        assert!(!f.is_available());
    }

    #[test]
    fn deserializes_tagged_json() {
        let json = r#"{
            "arima": {"status": "ok", "horizons": {"1": 101000.0, "7": null}},
            "lstm": {"status": "failed", "reason": "fit diverged"}
        }"#;
        let set: ForecastSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("arima").unwrap().price_at(1), Some(101000.0));
        assert_eq!(set.get("arima").unwrap().price_at(7), None);
        assert_eq!(
            set.get("lstm"),
            Some(&ModelForecast::unavailable("fit diverged"))
        );
    }

    #[test]
    fn failed_without_reason_gets_placeholder() {
        let f: ModelForecast = serde_json::from_str(r#"{"status": "failed"}"#).unwrap();
        assert_eq!(f, ModelForecast::unavailable("unspecified failure"));
    }
}
