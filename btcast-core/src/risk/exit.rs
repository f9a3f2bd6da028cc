//! Composite exit scorer.
//!
//! A fixed battery of risk conditions, each with a weight. The score is the
//! sum of triggered weights; the exit signal fires at `EXIT_THRESHOLD`, so no
//! single condition can force an exit on its own.
//!
//! Scoring is split in two steps: `ExitSnapshot::from_closes` reads the
//! indicators off the close series, `assess` applies the rules to a
//! snapshot plus the regime and funding inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::domain::RegimeLabel;
use crate::indicators::{log_returns, rolling_std, Indicator, Macd, Rsi, Sma};
use crate::stats::{finite, quantile, sample_std};

/// Score at or above which an exit is recommended.
pub const EXIT_THRESHOLD: f64 = 2.0;

/// Sole explanation entry when nothing fires.
pub const NO_CONDITIONS_SENTINEL: &str = "No major risk conditions triggered";

/// One risk condition, listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCondition {
    RsiOverbought,
    VolatilitySpike,
    BearRegime,
    NegativeFunding,
    MacdBearCrossover,
    BelowLongTermTrend,
}

impl ExitCondition {
    pub const ALL: [ExitCondition; 6] = [
        ExitCondition::RsiOverbought,
        ExitCondition::VolatilitySpike,
        ExitCondition::BearRegime,
        ExitCondition::NegativeFunding,
        ExitCondition::MacdBearCrossover,
        ExitCondition::BelowLongTermTrend,
    ];

    pub fn weight(self) -> f64 {
        ExitWeights::DEFAULT.weight_of(self)
    }

    pub fn code(self) -> &'static str {
        match self {
            ExitCondition::RsiOverbought => "rsi_overbought",
            ExitCondition::VolatilitySpike => "volatility_spike",
            ExitCondition::BearRegime => "bear_regime",
            ExitCondition::NegativeFunding => "negative_funding",
            ExitCondition::MacdBearCrossover => "macd_bear_crossover",
            ExitCondition::BelowLongTermTrend => "below_long_term_trend",
        }
    }
}

impl fmt::Display for ExitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-condition weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExitWeights {
    pub rsi_overbought: f64,
    pub volatility_spike: f64,
    pub bear_regime: f64,
    pub negative_funding: f64,
    pub macd_bear_crossover: f64,
    pub below_long_term_trend: f64,
}

impl ExitWeights {
    pub const DEFAULT: Self = Self {
        rsi_overbought: 1.0,
        volatility_spike: 0.8,
        bear_regime: 1.2,
        negative_funding: 0.5,
        macd_bear_crossover: 1.0,
        below_long_term_trend: 0.7,
    };

    pub fn weight_of(&self, condition: ExitCondition) -> f64 {
        match condition {
            ExitCondition::RsiOverbought => self.rsi_overbought,
            ExitCondition::VolatilitySpike => self.volatility_spike,
            ExitCondition::BearRegime => self.bear_regime,
            ExitCondition::NegativeFunding => self.negative_funding,
            ExitCondition::MacdBearCrossover => self.macd_bear_crossover,
            ExitCondition::BelowLongTermTrend => self.below_long_term_trend,
        }
    }
}

/// Indicator parameters and data requirements for each condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExitRules {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    /// RSI is read only with strictly more closes than this.
    pub rsi_min_closes: usize,
    pub recent_vol_window: usize,
    pub rolling_vol_window: usize,
    pub vol_quantile: f64,
    pub macd: Macd,
    pub long_ma_period: usize,
}

impl ExitRules {
    pub const DEFAULT: Self = Self {
        rsi_period: 14,
        rsi_overbought: 70.0,
        rsi_min_closes: 20,
        recent_vol_window: 20,
        rolling_vol_window: 60,
        vol_quantile: 0.75,
        macd: Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        },
        long_ma_period: 200,
    };
}

/// Indicator readings at the last close. `None` means not enough data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitSnapshot {
    pub rsi: Option<f64>,
    /// Sample std of the most recent log returns.
    pub recent_volatility: Option<f64>,
    /// Upper-quartile of the rolling std distribution.
    pub volatility_threshold: Option<f64>,
    pub macd_bear_crossover: bool,
    pub last_close: Option<f64>,
    pub long_ma: Option<f64>,
}

impl ExitSnapshot {
    /// Read indicator values off a close series with the default rules.
    pub fn from_closes(closes: &[f64]) -> Self {
        Self::with_rules(closes, &ExitRules::DEFAULT)
    }

    /// Non-finite closes are dropped before anything is computed.
    pub fn with_rules(closes: &[f64], rules: &ExitRules) -> Self {
        let closes = finite(closes);
        let n = closes.len();

        let rsi = if n > rules.rsi_min_closes {
            Rsi::new(rules.rsi_period).latest(&closes)
        } else {
            None
        };

        // Data requirements count closes, not returns.
        let returns = log_returns(&closes);
        let recent_volatility = if n > rules.recent_vol_window {
            let tail = &returns[returns.len().saturating_sub(rules.recent_vol_window)..];
            Some(sample_std(tail)).filter(|v| v.is_finite())
        } else {
            None
        };
        let volatility_threshold = if n > rules.rolling_vol_window {
            let rolling = rolling_std(&returns, rules.rolling_vol_window);
            Some(quantile(&rolling, rules.vol_quantile)).filter(|v| v.is_finite())
        } else {
            None
        };

        let macd_bear_crossover = n > 2 && rules.macd.compute(&closes).bearish_cross_at_end();

        let long_ma = if n >= rules.long_ma_period {
            Sma::new(rules.long_ma_period).latest(&closes)
        } else {
            None
        };

        Self {
            rsi,
            recent_volatility,
            volatility_threshold,
            macd_bear_crossover,
            last_close: closes.last().copied(),
            long_ma,
        }
    }
}

/// Exit recommendation with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAssessment {
    pub signal: bool,
    pub score: f64,
    /// Never empty.
    pub explanation: Vec<String>,
    pub triggered: Vec<ExitCondition>,
}

impl ExitAssessment {
    /// Reasons joined with "; " for one-line display.
    pub fn explanation_line(&self) -> String {
        self.explanation.join("; ")
    }
}

/// Apply the exit rules to pre-computed indicator readings.
pub fn assess(
    snapshot: &ExitSnapshot,
    regime: RegimeLabel,
    funding_rate: Option<f64>,
) -> ExitAssessment {
    let rules = &ExitRules::DEFAULT;
    let mut fired: Vec<(ExitCondition, String)> = Vec::new();

    if let Some(rsi) = snapshot.rsi.filter(|&v| v > rules.rsi_overbought) {
        fired.push((
            ExitCondition::RsiOverbought,
            format!("RSI is overbought at {rsi:.1} (>{:.0})", rules.rsi_overbought),
        ));
    }

    let vol = (snapshot.recent_volatility, snapshot.volatility_threshold);
    if let (Some(recent), Some(threshold)) = vol {
        if recent > threshold {
            fired.push((
                ExitCondition::VolatilitySpike,
                format!("Recent volatility {recent:.4} above 75th percentile {threshold:.4}"),
            ));
        }
    }

    if regime.is_bear() {
        fired.push((
            ExitCondition::BearRegime,
            "Regime classifier indicates bear regime".to_string(),
        ));
    }

    if let Some(rate) = funding_rate.filter(|&r| r < 0.0) {
        fired.push((
            ExitCondition::NegativeFunding,
            format!("Funding rate negative at {rate:.6} (short bias)"),
        ));
    }

    if snapshot.macd_bear_crossover {
        fired.push((
            ExitCondition::MacdBearCrossover,
            "MACD bear crossover detected".to_string(),
        ));
    }

    if let (Some(close), Some(ma)) = (snapshot.last_close, snapshot.long_ma) {
        if close < ma {
            fired.push((
                ExitCondition::BelowLongTermTrend,
                format!(
                    "Price {close:.2} below {}-day moving average {ma:.2}",
                    rules.long_ma_period
                ),
            ));
        }
    }

    let score: f64 = fired.iter().map(|(c, _)| c.weight()).sum();
    let triggered: Vec<ExitCondition> = fired.iter().map(|(c, _)| *c).collect();
    let mut explanation: Vec<String> = fired.into_iter().map(|(_, s)| s).collect();
    if explanation.is_empty() {
        explanation.push(NO_CONDITIONS_SENTINEL.to_string());
    }

    let signal = score >= EXIT_THRESHOLD;
    debug!(score, signal, ?triggered, "exit conditions evaluated");

    ExitAssessment {
        signal,
        score,
        explanation,
        triggered,
    }
}

/// Score an exit from an ascending close series.
pub fn score_exit(
    closes: &[f64],
    regime: RegimeLabel,
    funding_rate: Option<f64>,
) -> ExitAssessment {
    assess(&ExitSnapshot::from_closes(closes), regime, funding_rate)
}
