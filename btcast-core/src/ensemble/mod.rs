//! Ensemble meta-learner: normalize model outputs, weight them by regime or
//! backtest error, and blend into the reported horizons.

pub mod blender;
pub mod normalizer;
pub mod weights;

pub use blender::{
    blend, hourly_from_daily, BlendOutcome, BlendedForecast, Blender, DAY_HORIZON, MONTH_HORIZON,
    WEEK_HORIZON,
};
pub use normalizer::{normalize_forecasts, ForecastTable};
pub use weights::{
    compute_weights, inverse_error_weights, RegimeWeightPolicy, RegimeWeightTable, WeightVector,
    WeightingMethod,
};
