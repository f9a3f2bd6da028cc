//! Forecast report: the persisted outcome of one pipeline run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use btcast_core::domain::{Horizon, RegimeLabel, RegimeProbabilities};
use btcast_core::ensemble::BlendOutcome;
use btcast_core::risk::{ExitAssessment, ExitSnapshot, RiskMetrics};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 over config, history and model outputs.
    pub report_id: String,
    pub as_of: NaiveDate,
    pub last_price: f64,
    pub last_date: NaiveDate,
    pub history_len: usize,
    pub has_synthetic: bool,
    /// Whether the realtime spot price was appended to the history.
    pub spot_appended: bool,
    pub regime: RegimeLabel,
    pub regime_probabilities: Option<RegimeProbabilities>,
    pub funding_rate: Option<f64>,
    pub models: Vec<ModelStatus>,
    pub blend: BlendOutcome,
    pub risk: RiskSummary,
    pub rolling: Option<RollingSummary>,
    pub exit: ExitAssessment,
    pub exit_snapshot: ExitSnapshot,
    #[serde(default)]
    pub hit_probabilities: BTreeMap<Horizon, f64>,
    pub hit_target: Option<f64>,
    pub volatility_forecast: Option<Vec<f64>>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Per-model health as seen by the blender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub name: String,
    pub available: bool,
    pub failure_reason: Option<String>,
    /// Cells of this model's column filled with the last price.
    pub imputed_cells: usize,
    pub weight: f64,
}

/// Headline risk metrics with undefined values as `None`.
///
/// JSON has no NaN, so the core's NaN sentinels become nulls here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub calmar: Option<f64>,
}

impl From<RiskMetrics> for RiskSummary {
    fn from(m: RiskMetrics) -> Self {
        Self {
            sharpe: defined(m.sharpe),
            sortino: defined(m.sortino),
            max_drawdown: defined(m.max_drawdown),
            calmar: defined(m.calmar),
        }
    }
}

impl RiskSummary {
    /// (label, value) pairs in display order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("Sharpe", self.sharpe),
            ("Sortino", self.sortino),
            ("Max Drawdown", self.max_drawdown),
            ("Calmar", self.calmar),
        ]
    }
}

/// Latest rolling volatility and Sharpe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingSummary {
    pub window: usize,
    pub volatility: Option<f64>,
    pub sharpe: Option<f64>,
}

pub(crate) fn defined(v: f64) -> Option<f64> {
    Some(v).filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_metrics_become_none() {
        let summary = RiskSummary::from(RiskMetrics {
            sharpe: 1.5,
            sortino: f64::NAN,
            max_drawdown: -0.2,
            calmar: f64::INFINITY,
        });
        assert_eq!(summary.sharpe, Some(1.5));
        assert_eq!(summary.sortino, None);
        assert_eq!(summary.max_drawdown, Some(-0.2));
        assert_eq!(summary.calmar, None);
    }

    #[test]
    fn summary_serializes_none_as_null() {
        let summary = RiskSummary {
            sharpe: None,
            sortino: Some(0.5),
            max_drawdown: None,
            calmar: None,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert!(json["sharpe"].is_null());
        assert_eq!(json["sortino"], 0.5);
    }
}
