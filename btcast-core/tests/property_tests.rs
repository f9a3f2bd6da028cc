//! Property tests for ensemble and risk invariants.
//!
//! Uses proptest to verify:
//! 1. Weight normalization: weights sum to 1, or all are 0
//! 2. Determinism: identical inputs give identical outputs
//! 3. Fallback chain: missing horizons collapse onto the next shorter one
//! 4. Finiteness: a finite last price always yields a finite blend
//! 5. Exit score: always the sum of the triggered weights

use proptest::prelude::*;
use std::collections::BTreeMap;
use btcast_core::domain::{BacktestErrors, ForecastSet, ModelForecast, RegimeLabel};
use btcast_core::ensemble::{blend, compute_weights, RegimeWeightPolicy};
use btcast_core::risk::{max_drawdown, score_exit, EXIT_THRESHOLD};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_model() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["arima", "prophet", "lstm", "hmm", "mc", "garch"])
        .prop_map(str::to_string)
}

fn arb_regime() -> impl Strategy<Value = RegimeLabel> {
    prop::sample::select(vec![
        RegimeLabel::Bull,
        RegimeLabel::Bear,
        RegimeLabel::Sideways,
        RegimeLabel::Unknown,
    ])
}

fn arb_price() -> impl Strategy<Value = f64> {
    (1_000.0..200_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_model_forecast() -> impl Strategy<Value = ModelForecast> {
    prop_oneof![
        4 => prop::collection::btree_map(
            prop::sample::select(vec![1u32, 3, 7, 14, 30]),
            prop::option::weighted(0.8, arb_price()),
            0..5,
        )
        .prop_map(|horizons| ModelForecast::Available { horizons }),
        1 => Just(ModelForecast::unavailable("fit failed")),
    ]
}

fn arb_forecast_set() -> impl Strategy<Value = ForecastSet> {
    prop::collection::btree_map(arb_model(), arb_model_forecast(), 0..6)
        .prop_map(|m| m.into_iter().collect())
}

fn arb_errors() -> impl Strategy<Value = Option<BacktestErrors>> {
    prop::option::of(prop::collection::btree_map(
        arb_model(),
        prop_oneof![Just(0.0), Just(f64::NAN), 1.0..5_000.0_f64],
        0..5,
    ))
}

// ── 1. Weight normalization ──────────────────────────────────────────

proptest! {
    #[test]
    fn weights_sum_to_one_or_zero(
        models in prop::collection::btree_set(arb_model(), 0..6),
        regime in arb_regime(),
        errors in arb_errors(),
    ) {
        let models: Vec<String> = models.into_iter().collect();
        let (w, _) = compute_weights(&RegimeWeightPolicy::default(), &models, regime, errors.as_ref());
        let sum = w.sum();
        prop_assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-9, "sum = {}", sum);
        for (_, weight) in w.iter() {
            prop_assert!(weight >= 0.0);
        }
        prop_assert_eq!(w.len(), models.len());
    }
}

// ── 2–4. Blend determinism, fallback chain, finiteness ──────────────

proptest! {
    #[test]
    fn blend_is_deterministic(
        set in arb_forecast_set(),
        last in arb_price(),
        regime in arb_regime(),
        errors in arb_errors(),
    ) {
        let a = blend(&set, last, regime, errors.as_ref());
        let b = blend(&set, last, regime, errors.as_ref());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn blend_is_finite_for_finite_last_price(
        set in arb_forecast_set(),
        last in arb_price(),
        regime in arb_regime(),
        errors in arb_errors(),
    ) {
        let out = blend(&set, last, regime, errors.as_ref());
        prop_assert!(out.one_hour.is_finite());
        prop_assert!(out.one_day.is_finite());
        prop_assert!(out.one_week.is_finite());
        prop_assert!(out.one_month.is_finite());
    }

    #[test]
    fn missing_week_and_month_fall_back(
        day_prices in prop::collection::btree_map(arb_model(), arb_price(), 1..5),
        last in arb_price(),
        regime in arb_regime(),
    ) {
        let set: ForecastSet = day_prices
            .into_iter()
            .map(|(m, p)| (m, ModelForecast::from_prices([(1, p)])))
            .collect();
        let out = blend(&set, last, regime, None);
        prop_assert_eq!(out.one_week, out.one_day);
        prop_assert_eq!(out.one_month, out.one_week);
    }

    #[test]
    fn unpriced_models_blend_to_last_price_under_full_weight(
        models in prop::collection::btree_set(
            prop::sample::select(vec!["arima", "prophet", "lstm", "hmm", "mc"]), 1..5),
        last in arb_price(),
        regime in arb_regime(),
    ) {
        // Every cell imputed with `last` and weights sum to 1 → blend == last
        let set: ForecastSet = models
            .into_iter()
            .map(|m| (m.to_string(), ModelForecast::Available {
                horizons: BTreeMap::from([(1, None), (7, None)]),
            }))
            .collect();
        let out = blend(&set, last, regime, None);
        prop_assert!((out.one_day - last).abs() < 1e-6 * last);
        prop_assert!((out.one_week - last).abs() < 1e-6 * last);
    }
}

// ── 5. Risk and exit invariants ─────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_is_between_minus_one_and_zero(
        prices in prop::collection::vec(arb_price(), 1..200),
    ) {
        let dd = max_drawdown(&prices);
        prop_assert!((-1.0..=0.0).contains(&dd));
    }

    #[test]
    fn exit_signal_matches_threshold(
        prices in prop::collection::vec(arb_price(), 0..260),
        regime in arb_regime(),
        funding in prop::option::of(-0.01..0.01_f64),
    ) {
        let out = score_exit(&prices, regime, funding);
        let weight_sum: f64 = out.triggered.iter().map(|c| c.weight()).sum();
        prop_assert!((out.score - weight_sum).abs() < 1e-12);
        prop_assert_eq!(out.signal, out.score >= EXIT_THRESHOLD);
        prop_assert!(!out.explanation.is_empty());
        prop_assert!(out.score >= 0.0);
    }
}
