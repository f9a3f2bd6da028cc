//! Market regime label produced by the external regime classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Discrete market regime.
///
/// `Unknown` is what a failed classifier reports. It weights like `Sideways`
/// and never triggers the bear exit condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeLabel {
    Bull,
    Bear,
    Sideways,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized regime label '{0}' (expected bull, bear, sideways or unknown)")]
pub struct RegimeParseError(pub String);

impl RegimeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            RegimeLabel::Bull => "bull",
            RegimeLabel::Bear => "bear",
            RegimeLabel::Sideways => "sideways",
            RegimeLabel::Unknown => "unknown",
        }
    }

    /// Parse a classifier label, mapping anything unrecognized to `Unknown`.
    pub fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or(RegimeLabel::Unknown)
    }

    pub fn is_bear(self) -> bool {
        self == RegimeLabel::Bear
    }
}

impl FromStr for RegimeLabel {
    type Err = RegimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bull" => Ok(RegimeLabel::Bull),
            "bear" => Ok(RegimeLabel::Bear),
            "sideways" => Ok(RegimeLabel::Sideways),
            "unknown" => Ok(RegimeLabel::Unknown),
            _ => Err(RegimeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class-membership probabilities from the classifier, in bear/sideways/bull order.
///
/// Serialized as a three-element array to match the classifier's output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct RegimeProbabilities {
    pub bear: f64,
    pub sideways: f64,
    pub bull: f64,
}

impl RegimeProbabilities {
    /// Regime with the highest probability, or `Unknown` if any entry is non-finite.
    pub fn dominant(&self) -> RegimeLabel {
        let entries = [
            (RegimeLabel::Bear, self.bear),
            (RegimeLabel::Sideways, self.sideways),
            (RegimeLabel::Bull, self.bull),
        ];
        if entries.iter().any(|(_, p)| !p.is_finite()) {
            return RegimeLabel::Unknown;
        }
        entries
            .iter()
            .fold((RegimeLabel::Unknown, f64::NEG_INFINITY), |best, &(label, p)| {
                if p > best.1 {
                    (label, p)
                } else {
                    best
                }
            })
            .0
    }
}

impl From<[f64; 3]> for RegimeProbabilities {
    fn from(v: [f64; 3]) -> Self {
        Self {
            bear: v[0],
            sideways: v[1],
            bull: v[2],
        }
    }
}

impl From<RegimeProbabilities> for [f64; 3] {
    fn from(p: RegimeProbabilities) -> Self {
        [p.bear, p.sideways, p.bull]
    }
}
