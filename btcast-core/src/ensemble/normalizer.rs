//! Forecast normalization: heterogeneous per-model outputs → one dense table.

use serde::Serialize;
use tracing::debug;

use crate::domain::{ForecastSet, Horizon, ModelName};

/// Dense horizon × model price table.
///
/// Rows follow `horizons` (ascending), columns follow `models` (ascending by
/// name). Every cell is finite whenever the last price used to build the
/// table is finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTable {
    horizons: Vec<Horizon>,
    models: Vec<ModelName>,
    /// Row-major: `values[row * models.len() + col]`.
    values: Vec<f64>,
    imputed: Vec<usize>,
}

impl ForecastTable {
    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    pub fn models(&self) -> &[ModelName] {
        &self.models
    }

    pub fn is_empty(&self) -> bool {
        self.horizons.is_empty() || self.models.is_empty()
    }

    /// Cell for (horizon, model), if both exist in the table.
    pub fn get(&self, horizon: Horizon, model: &str) -> Option<f64> {
        let row = self.row_index(horizon)?;
        let col = self.models.iter().position(|m| m == model)?;
        Some(self.values[row * self.models.len() + col])
    }

    /// One row of prices in column order.
    pub fn row(&self, horizon: Horizon) -> Option<&[f64]> {
        let row = self.row_index(horizon)?;
        let width = self.models.len();
        Some(&self.values[row * width..(row + 1) * width])
    }

    /// Number of cells in each model's column filled with the last price.
    pub fn imputed_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.models
            .iter()
            .map(|m| m.as_str())
            .zip(self.imputed.iter().copied())
    }

    /// Models with at least one imputed cell.
    pub fn degraded_models(&self) -> Vec<ModelName> {
        self.imputed_counts()
            .filter(|&(_, n)| n > 0)
            .map(|(m, _)| m.to_string())
            .collect()
    }

    fn row_index(&self, horizon: Horizon) -> Option<usize> {
        self.horizons.binary_search(&horizon).ok()
    }
}

/// Align all model outputs onto the union of horizons.
///
/// Missing horizons, non-finite prices and every cell of an unavailable
/// model are filled with `last_price`.
pub fn normalize_forecasts(forecasts: &ForecastSet, last_price: f64) -> ForecastTable {
    let horizons = forecasts.horizons();
    let models: Vec<ModelName> = forecasts.models().map(str::to_string).collect();
    let width = models.len();

    let mut values = Vec::with_capacity(horizons.len() * width);
    let mut imputed = vec![0usize; width];

    for &h in &horizons {
        for (col, (_, forecast)) in forecasts.iter().enumerate() {
            match forecast.price_at(h) {
                Some(p) => values.push(p),
                None => {
                    values.push(last_price);
                    imputed[col] += 1;
                }
            }
        }
    }

    for (model, &n) in models.iter().zip(&imputed) {
        if n > 0 {
            debug!(model = %model, cells = n, last_price, "imputed missing forecasts with last price");
        }
    }

    ForecastTable {
        horizons,
        models,
        values,
        imputed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastSet;

    #[test]
    fn union_of_horizons_sorted() {
        let set = ForecastSet::new()
            .with_prices("arima", [(7, 105.0), (1, 101.0)])
            .with_prices("lstm", [(30, 110.0)]);
        let table = normalize_forecasts(&set, 100.0);
        assert_eq!(table.horizons(), &[1, 7, 30]);
        assert_eq!(table.models(), &["arima".to_string(), "lstm".to_string()]);
    }

    #[test]
    fn missing_cells_take_last_price() {
        let set = ForecastSet::new()
            .with_prices("arima", [(1, 101.0)])
            .with_prices("lstm", [(7, 110.0)]);
        let table = normalize_forecasts(&set, 100.0);
        assert_eq!(table.get(1, "arima"), Some(101.0));
        assert_eq!(table.get(7, "arima"), Some(100.0));
        assert_eq!(table.get(1, "lstm"), Some(100.0));
        assert_eq!(table.get(7, "lstm"), Some(110.0));
        assert_eq!(table.row(7), Some(&[100.0, 110.0][..]));
    }

    #[test]
    fn nan_and_unavailable_are_imputed() {
        let set = ForecastSet::new()
            .with_prices("arima", [(1, f64::NAN), (7, 104.0)])
            .with_failure("prophet", "fit diverged");
        let table = normalize_forecasts(&set, 100.0);
        assert_eq!(table.get(1, "arima"), Some(100.0));
        assert_eq!(table.get(1, "prophet"), Some(100.0));
        assert_eq!(table.get(7, "prophet"), Some(100.0));

        let counts: Vec<_> = table.imputed_counts().collect();
        assert_eq!(counts, vec![("arima", 1), ("prophet", 2)]);
        assert_eq!(table.degraded_models(), vec!["arima", "prophet"]);
    }

    #[test]
    fn empty_set_gives_empty_table() {
        let table = normalize_forecasts(&ForecastSet::new(), 100.0);
        assert!(table.is_empty());
        assert!(table.horizons().is_empty());
        assert_eq!(table.get(1, "arima"), None);
    }

    #[test]
    fn unavailable_only_has_no_rows() {
        let set = ForecastSet::new().with_failure("lstm", "no gpu");
        let table = normalize_forecasts(&set, 100.0);
        assert!(table.is_empty());
        assert_eq!(table.models(), &["lstm".to_string()]);
    }
}
