//! BTCast Core: domain types, indicators, ensemble blending, risk metrics, exit scoring.
//!
//! This crate contains the decision logic of the forecaster:
//! - Domain types (price points, per-model forecasts, regime labels)
//! - Indicators over daily closes (EMA, SMA, smoothed RSI, MACD, rolling dispersion)
//! - Ensemble meta-learner (normalization, regime/inverse-error weighting, blending)
//! - Risk metrics (Sharpe, Sortino, max drawdown, Calmar, rolling risk)
//! - Composite exit scorer
//!
//! Everything here is synchronous and pure. Degenerate input never fails:
//! missing data is imputed and undefined numerics come back as `f64::NAN`.

pub mod domain;
pub mod ensemble;
pub mod indicators;
pub mod risk;
pub mod stats;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all public value types are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::PricePoint>();
        require_sync::<domain::PricePoint>();
        require_send::<domain::ForecastSet>();
        require_sync::<domain::ForecastSet>();
        require_send::<domain::ModelForecast>();
        require_sync::<domain::ModelForecast>();
        require_send::<domain::RegimeLabel>();
        require_sync::<domain::RegimeLabel>();
        require_send::<domain::RegimeProbabilities>();
        require_sync::<domain::RegimeProbabilities>();

        // Ensemble types
        require_send::<ensemble::ForecastTable>();
        require_sync::<ensemble::ForecastTable>();
        require_send::<ensemble::RegimeWeightPolicy>();
        require_sync::<ensemble::RegimeWeightPolicy>();
        require_send::<ensemble::WeightVector>();
        require_sync::<ensemble::WeightVector>();
        require_send::<ensemble::Blender>();
        require_sync::<ensemble::Blender>();
        require_send::<ensemble::BlendedForecast>();
        require_sync::<ensemble::BlendedForecast>();
        require_send::<ensemble::BlendOutcome>();
        require_sync::<ensemble::BlendOutcome>();

        // Risk types
        require_send::<risk::RiskMetrics>();
        require_sync::<risk::RiskMetrics>();
        require_send::<risk::RollingRisk>();
        require_sync::<risk::RollingRisk>();
        require_send::<risk::ExitSnapshot>();
        require_sync::<risk::ExitSnapshot>();
        require_send::<risk::ExitAssessment>();
        require_sync::<risk::ExitAssessment>();

        // Indicators
        require_send::<indicators::Rsi>();
        require_sync::<indicators::Rsi>();
        require_send::<indicators::Macd>();
        require_sync::<indicators::Macd>();
    }

    /// Architecture contract: indicators see only closes up to the bar they
    /// compute, so truncating the series never changes earlier values.
    #[test]
    fn indicators_have_no_lookahead() {
        use indicators::Indicator;

        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let boxed: Vec<Box<dyn Indicator>> = vec![
            Box::new(indicators::Sma::new(20)),
            Box::new(indicators::Rsi::new(14)),
        ];
        for ind in &boxed {
            let full = ind.compute(&closes);
            let truncated = ind.compute(&closes[..80]);
            for i in 0..80 {
                let (a, b) = (full[i], truncated[i]);
                assert!(
                    (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-12,
                    "{} changed at {i} when future closes were added",
                    ind.name()
                );
            }
        }
    }
}
