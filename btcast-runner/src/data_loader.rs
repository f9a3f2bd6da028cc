//! Input loading for the runner.
//!
//! Two inputs feed a run:
//! 1. A daily price history CSV (`date` plus `close` or `price` columns)
//! 2. A JSON document with the upstream model outputs
//!
//! When no history file is available, `generate_synthetic_history` produces
//! a seeded random walk. Synthetic data is a developer-only demo mode and
//! reports built on it are tagged.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use btcast_core::domain::{
    BacktestErrors, ForecastSet, Horizon, PricePoint, RegimeLabel, RegimeProbabilities,
};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{source_name}': {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("'{source_name}' has no '{column}' column")]
    MissingColumn {
        source_name: String,
        column: &'static str,
    },

    #[error("row {row}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: invalid price '{value}' (must be a finite positive number)")]
    InvalidPrice { row: usize, value: String },

    #[error("price history '{source_name}' is empty")]
    EmptyHistory { source_name: String },

    #[error("invalid model outputs in '{source_name}': {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the upstream models produced for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOutputs {
    pub forecasts: ForecastSet,
    /// Raw classifier label; unrecognized labels read as `unknown`.
    #[serde(default)]
    pub regime: Option<String>,
    #[serde(default)]
    pub regime_probabilities: Option<RegimeProbabilities>,
    #[serde(default)]
    pub funding_rate: Option<f64>,
    #[serde(default)]
    pub backtest_errors: Option<BacktestErrors>,
    /// Latest realtime price, appended to the history when newer.
    #[serde(default)]
    pub spot_price: Option<f64>,
    /// Monte Carlo probability of touching `hit_target` within each horizon.
    #[serde(default)]
    pub hit_probabilities: Option<BTreeMap<Horizon, f64>>,
    #[serde(default)]
    pub hit_target: Option<f64>,
    /// Volatility model forecast, in percent per day.
    #[serde(default)]
    pub volatility_forecast: Option<Vec<f64>>,
}

impl ModelOutputs {
    /// The explicit label if given, else the most probable class, else `unknown`.
    pub fn regime_label(&self) -> RegimeLabel {
        match (&self.regime, &self.regime_probabilities) {
            (Some(label), _) => RegimeLabel::parse_lenient(label),
            (None, Some(probs)) => probs.dominant(),
            (None, None) => RegimeLabel::Unknown,
        }
    }

    /// Funding rate if it is a usable number.
    pub fn funding(&self) -> Option<f64> {
        self.funding_rate.filter(|r| r.is_finite())
    }
}

/// Load a price history CSV from disk.
pub fn load_history(path: impl AsRef<Path>) -> Result<Vec<PricePoint>, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let history = parse_history(file, &path.display().to_string())?;
    info!(path = %path.display(), rows = history.len(), "loaded price history");
    Ok(history)
}

/// Parse a price history from any reader.
///
/// Rows come back sorted ascending by date; a repeated date keeps the last
/// row seen. Timestamps like `2024-01-01T00:00:00Z` are truncated to the date.
pub fn parse_history<R: Read>(reader: R, source_name: &str) -> Result<Vec<PricePoint>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        source_name: source_name.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let date_col = find("date").ok_or_else(|| LoadError::MissingColumn {
        source_name: source_name.to_string(),
        column: "date",
    })?;
    let price_col = find("close")
        .or_else(|| find("price"))
        .ok_or_else(|| LoadError::MissingColumn {
            source_name: source_name.to_string(),
            column: "close",
        })?;

    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // Header is line 1
        let row = i + 2;

        let raw_date = record.get(date_col).unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| LoadError::InvalidDate {
            row,
            value: raw_date.to_string(),
        })?;

        let raw_price = record.get(price_col).unwrap_or("");
        let price = raw_price
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| LoadError::InvalidPrice {
                row,
                value: raw_price.to_string(),
            })?;

        if by_date.insert(date, price).is_some() {
            debug!(row, %date, "duplicate date; keeping the later row");
        }
    }

    if by_date.is_empty() {
        return Err(LoadError::EmptyHistory {
            source_name: source_name.to_string(),
        });
    }

    Ok(by_date
        .into_iter()
        .map(|(date, close)| PricePoint::new(date, close))
        .collect())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Load the model outputs JSON document.
pub fn load_model_outputs(path: impl AsRef<Path>) -> Result<ModelOutputs, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let outputs = parse_model_outputs(&content, &path.display().to_string())?;
    info!(
        path = %path.display(),
        models = outputs.forecasts.len(),
        "loaded model outputs"
    );
    Ok(outputs)
}

pub fn parse_model_outputs(content: &str, source_name: &str) -> Result<ModelOutputs, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::Json {
        source_name: source_name.to_string(),
        source,
    })
}

/// Append `spot` as the `as_of` close when the history ends before `as_of`.
///
/// Returns whether a point was appended. Unusable spot prices are skipped.
pub fn append_spot_price(history: &mut Vec<PricePoint>, spot: f64, as_of: NaiveDate) -> bool {
    let point = PricePoint::new(as_of, spot);
    if !point.is_valid() {
        warn!(spot, "ignoring unusable spot price");
        return false;
    }
    match history.last() {
        Some(last) if last.date >= as_of => false,
        _ => {
            history.push(point);
            debug!(%as_of, spot, "appended spot price to history");
            true
        }
    }
}

/// Compute a deterministic BLAKE3 hash over a price history.
pub fn history_hash(history: &[PricePoint]) -> String {
    let mut hasher = blake3::Hasher::new();
    for point in history {
        hasher.update(point.date.to_string().as_bytes());
        hasher.update(&point.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a synthetic daily history ending at `end`.
///
/// Geometric random walk from 30,000 with ±4% daily moves and a slight
/// upward drift. Deterministic for a given seed. These prices are clearly
/// fake and reports built on them are tagged as synthetic.
pub fn generate_synthetic_history(seed: u64, end: NaiveDate, days: usize) -> Vec<PricePoint> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let start = end - Duration::days(days.saturating_sub(1) as i64);

    let mut price = 30_000.0_f64;
    let mut history = Vec::with_capacity(days);
    for offset in 0..days {
        history.push(PricePoint::new(start + Duration::days(offset as i64), price));
        let daily_return: f64 = rng.gen_range(-0.04..0.0415);
        price *= 1.0 + daily_return;
    }
    history
}
