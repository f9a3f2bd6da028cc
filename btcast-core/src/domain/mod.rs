//! Domain types for BTCast.

pub mod forecast;
pub mod price;
pub mod regime;

pub use forecast::{BacktestErrors, ForecastSet, Horizon, ModelForecast, ModelName};
pub use price::{closes, PricePoint};
pub use regime::{RegimeLabel, RegimeParseError, RegimeProbabilities};

/// Canonical model identifiers known to the static weight tables.
pub const ARIMA: &str = "arima";
pub const PROPHET: &str = "prophet";
pub const LSTM: &str = "lstm";
pub const HMM: &str = "hmm";
pub const MONTE_CARLO: &str = "mc";

/// The canonical model set, in weight-table order.
pub const CANONICAL_MODELS: [&str; 5] = [ARIMA, PROPHET, LSTM, HMM, MONTE_CARLO];
