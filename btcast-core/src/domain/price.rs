//! PricePoint: one daily close observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single (date, close) observation.
///
/// Histories are ordered ascending by date with at most one point per
/// calendar day. Ordering is established by the loader; the core only
/// reads the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// Returns true if the close is usable (finite and positive).
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Extract the close series, dropping non-finite values.
pub fn closes(history: &[PricePoint]) -> Vec<f64> {
    history
        .iter()
        .map(|p| p.close)
        .filter(|c| c.is_finite())
        .collect()
}
