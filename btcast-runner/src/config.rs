//! Serializable pipeline configuration.
//!
//! Loaded from TOML. Every section and field is optional; the defaults
//! reproduce the stock weight tables, a zero risk-free rate and a 30-day
//! rolling window.
//!
//! ```toml
//! [pipeline]
//! seed = 42
//! as_of = "2025-01-15"
//!
//! [risk]
//! risk_free_rate = 0.0
//! rolling_window = 30
//!
//! [ensemble.bull]
//! arima = 0.25
//! prophet = 0.35
//! lstm = 0.25
//! hmm = 0.05
//! mc = 0.10
//!
//! [report]
//! output_dir = "reports"
//! formats = ["json", "markdown"]
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use btcast_core::ensemble::{RegimeWeightPolicy, RegimeWeightTable};
use btcast_core::risk::DEFAULT_ROLLING_WINDOW;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level configuration for one forecast run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub pipeline: PipelineSection,
    pub risk: RiskSection,
    pub ensemble: EnsembleSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    /// Seed for the synthetic price generator.
    pub seed: u64,
    /// Report date. Defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
    /// Length of a synthetic history in days.
    pub synthetic_days: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            seed: 42,
            as_of: None,
            synthetic_days: 730,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskSection {
    /// Risk-free rate per period (per day).
    pub risk_free_rate: f64,
    pub rolling_window: usize,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

/// Optional per-regime overrides of the stock weight tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnsembleSection {
    pub bull: Option<RegimeWeightTable>,
    pub bear: Option<RegimeWeightTable>,
    pub sideways: Option<RegimeWeightTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSection {
    pub output_dir: PathBuf,
    pub formats: Vec<ReportFormat>,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            formats: vec![ReportFormat::Json, ReportFormat::Markdown],
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.risk.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid(
                "risk.risk_free_rate must be finite".into(),
            ));
        }
        if self.risk.rolling_window < 2 {
            return Err(ConfigError::Invalid(format!(
                "risk.rolling_window must be >= 2, got {}",
                self.risk.rolling_window
            )));
        }
        if self.pipeline.synthetic_days < 2 {
            return Err(ConfigError::Invalid(format!(
                "pipeline.synthetic_days must be >= 2, got {}",
                self.pipeline.synthetic_days
            )));
        }
        let overrides = [
            ("bull", &self.ensemble.bull),
            ("bear", &self.ensemble.bear),
            ("sideways", &self.ensemble.sideways),
        ];
        for (regime, table) in overrides {
            let Some(table) = table else { continue };
            for (model, w) in table.entries() {
                if !w.is_finite() || w < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "ensemble.{regime}.{model} must be a non-negative number, got {w}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stock tables with any configured overrides applied.
    pub fn weight_policy(&self) -> RegimeWeightPolicy {
        let stock = RegimeWeightPolicy::default();
        RegimeWeightPolicy {
            bull: self.ensemble.bull.unwrap_or(stock.bull),
            bear: self.ensemble.bear.unwrap_or(stock.bear),
            sideways: self.ensemble.sideways.unwrap_or(stock.sideways),
        }
    }

    /// Deterministic BLAKE3 digest of this configuration.
    ///
    /// The output directory is excluded so moving reports does not change ids.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let mut hashed = self.clone();
        hashed.report.output_dir = PathBuf::new();
        let json = serde_json::to_string(&hashed)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
