//! Risk metrics and the composite exit scorer.

pub mod exit;
pub mod metrics;

pub use exit::{
    assess, score_exit, ExitAssessment, ExitCondition, ExitRules, ExitSnapshot, ExitWeights,
    EXIT_THRESHOLD, NO_CONDITIONS_SENTINEL,
};
pub use metrics::{
    calmar_ratio, max_drawdown, rolling_risk_metrics, sharpe_ratio, sortino_ratio, RiskMetrics,
    RollingRisk, DEFAULT_ROLLING_WINDOW, PERIODS_PER_YEAR,
};
