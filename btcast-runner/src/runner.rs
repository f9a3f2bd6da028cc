//! Pipeline runner: wires together inputs, the ensemble, risk metrics and
//! the exit scorer into one `ForecastReport`.
//!
//! Entry points:
//! - `run_from_files()`: loads history CSV + model outputs JSON, then runs. Used by the CLI.
//! - `run_synthetic()`: seeded synthetic history + given model outputs. Demo mode.
//! - `run_pipeline()`: pre-loaded inputs. Used by both of the above and by tests.

use chrono::{NaiveDate, Utc};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use btcast_core::domain::{closes, ModelForecast, PricePoint};
use btcast_core::ensemble::{Blender, WeightVector};
use btcast_core::indicators::log_returns;
use btcast_core::risk::{assess, rolling_risk_metrics, ExitSnapshot, RiskMetrics};

use crate::config::{ConfigError, PipelineConfig};
use crate::data_loader::{
    append_spot_price, generate_synthetic_history, history_hash, load_history,
    load_model_outputs, LoadError, ModelOutputs,
};
use crate::result::{defined, ForecastReport, ModelStatus, RollingSummary, SCHEMA_VERSION};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("price history is empty")]
    EmptyHistory,
    #[error("last price {0} is not a finite positive number")]
    InvalidLastPrice(f64),
}

/// Pre-loaded inputs for one run.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Ascending daily closes.
    pub history: Vec<PricePoint>,
    pub outputs: ModelOutputs,
    pub has_synthetic: bool,
}

/// Load inputs from disk and run the pipeline.
pub fn run_from_files(
    config: &PipelineConfig,
    history_path: impl AsRef<Path>,
    outputs_path: impl AsRef<Path>,
) -> Result<ForecastReport, RunError> {
    let history = load_history(history_path)?;
    let outputs = load_model_outputs(outputs_path)?;
    run_pipeline(
        config,
        PipelineInputs {
            history,
            outputs,
            has_synthetic: false,
        },
    )
}

/// Run on a seeded synthetic history.
pub fn run_synthetic(
    config: &PipelineConfig,
    outputs: ModelOutputs,
) -> Result<ForecastReport, RunError> {
    let as_of = report_date(config);
    warn!(
        seed = config.pipeline.seed,
        "generating synthetic price history; the report will be tagged as synthetic"
    );
    let history =
        generate_synthetic_history(config.pipeline.seed, as_of, config.pipeline.synthetic_days);
    run_pipeline(
        config,
        PipelineInputs {
            history,
            outputs,
            has_synthetic: true,
        },
    )
}

/// Run every stage on pre-loaded inputs.
pub fn run_pipeline(
    config: &PipelineConfig,
    inputs: PipelineInputs,
) -> Result<ForecastReport, RunError> {
    config.validate()?;
    let PipelineInputs {
        mut history,
        outputs,
        has_synthetic,
    } = inputs;
    let as_of = report_date(config);

    // 1. Realtime append
    let spot_appended = match outputs.spot_price {
        Some(spot) => append_spot_price(&mut history, spot, as_of),
        None => false,
    };

    let last = *history.last().ok_or(RunError::EmptyHistory)?;
    if !last.is_valid() {
        return Err(RunError::InvalidLastPrice(last.close));
    }
    let series = closes(&history);
    info!(
        rows = history.len(),
        last_price = last.close,
        last_date = %last.date,
        spot_appended,
        "stage 1/4: price history ready"
    );

    // 2. Risk metrics
    let risk = RiskMetrics::from_prices(&series, config.risk.risk_free_rate);
    let rolling = rolling_risk_metrics(&log_returns(&series), config.risk.rolling_window)
        .latest()
        .map(|(volatility, sharpe)| RollingSummary {
            window: config.risk.rolling_window,
            volatility: defined(volatility),
            sharpe: defined(sharpe),
        });
    info!(sharpe = risk.sharpe, max_drawdown = risk.max_drawdown, "stage 2/4: risk metrics");

    // 3. Ensemble blend
    let regime = outputs.regime_label();
    let blender = Blender::new(config.weight_policy());
    let blend = blender.blend_detailed(
        &outputs.forecasts,
        last.close,
        regime,
        outputs.backtest_errors.as_ref(),
    );
    let models = model_statuses(&outputs, &blend.weights);
    if !blend.degraded_models.is_empty() {
        warn!(models = ?blend.degraded_models, "some model outputs were imputed with the last price");
    }
    info!(%regime, one_day = blend.forecast.one_day, "stage 3/4: ensemble blended");

    // 4. Exit signal
    let exit_snapshot = ExitSnapshot::from_closes(&series);
    let exit = assess(&exit_snapshot, regime, outputs.funding());
    info!(signal = exit.signal, score = exit.score, "stage 4/4: exit scored");

    let report_id = report_id(config, &history, &outputs)?;

    Ok(ForecastReport {
        schema_version: SCHEMA_VERSION,
        report_id,
        as_of,
        last_price: last.close,
        last_date: last.date,
        history_len: history.len(),
        has_synthetic,
        spot_appended,
        regime,
        regime_probabilities: outputs.regime_probabilities,
        funding_rate: outputs.funding(),
        models,
        blend,
        risk: risk.into(),
        rolling,
        exit,
        exit_snapshot,
        hit_probabilities: outputs
            .hit_probabilities
            .clone()
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, p)| p.is_finite())
            .collect(),
        hit_target: outputs.hit_target.filter(|t| t.is_finite()),
        volatility_forecast: outputs
            .volatility_forecast
            .as_ref()
            .map(|v| v.iter().copied().filter(|x| x.is_finite()).collect()),
    })
}

/// Configured report date, or today in UTC.
pub fn report_date(config: &PipelineConfig) -> NaiveDate {
    config
        .pipeline
        .as_of
        .unwrap_or_else(|| Utc::now().date_naive())
}

fn model_statuses(outputs: &ModelOutputs, weights: &WeightVector) -> Vec<ModelStatus> {
    let horizons = outputs.forecasts.horizons();
    outputs
        .forecasts
        .iter()
        .map(|(name, forecast)| {
            let failure_reason = match forecast {
                ModelForecast::Unavailable { reason } => {
                    warn!(model = name, %reason, "model unavailable; imputing last price");
                    Some(reason.clone())
                }
                ModelForecast::Available { .. } => None,
            };
            ModelStatus {
                name: name.to_string(),
                available: forecast.is_available(),
                failure_reason,
                imputed_cells: horizons
                    .iter()
                    .filter(|&&h| forecast.price_at(h).is_none())
                    .count(),
                weight: weights.get(name),
            }
        })
        .collect()
}

/// Deterministic report id over config, history and model outputs.
fn report_id(
    config: &PipelineConfig,
    history: &[PricePoint],
    outputs: &ModelOutputs,
) -> Result<String, RunError> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(config.config_hash()?.as_bytes());
    hasher.update(history_hash(history).as_bytes());
    let outputs_json = serde_json::to_vec(outputs).map_err(ConfigError::from)?;
    hasher.update(&outputs_json);
    Ok(hasher.finalize().to_hex().to_string())
}
