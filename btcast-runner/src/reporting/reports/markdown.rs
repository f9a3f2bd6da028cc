//! Markdown report generator.

use btcast_core::ensemble::WeightingMethod;

use super::{fmt_metric, format_usd, horizon_label};
use crate::result::ForecastReport;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn generate(&self, report: &ForecastReport) -> String {
        let f = &report.blend.forecast;
        let mut md = format!(
            "# BTC Forecast Report\n\n\
Report ID: `{}`\n\n\
## Summary\n\
- As of: {}\n\
- Last price: {} ({})\n\
- Regime: {}\n\
- Signal: **{}** (score {:.2})\n\
- 1d blended forecast: {}\n",
            report.report_id,
            report.as_of,
            format_usd(report.last_price),
            report.last_date,
            report.regime,
            if report.exit.signal { "EXIT" } else { "HOLD" },
            report.exit.score,
            format_usd(f.one_day),
        );
        if report.has_synthetic {
            md.push_str("\n> Built on a synthetic price history. Not market data.\n");
        }

        // Blended forecasts
        md.push_str("\n## Ensemble Forecast\n\n");
        match report.blend.method {
            WeightingMethod::RegimeTable { regime } => {
                md.push_str(&format!("Weighting: `{regime}` regime table\n\n"))
            }
            WeightingMethod::InverseError => {
                md.push_str("Weighting: inverse backtest error\n\n")
            }
        }
        md.push_str("| Horizon | Price | Change |\n");
        md.push_str("|---------|-------|--------|\n");
        for (label, value) in [
            ("1h", f.one_hour),
            ("1d", f.one_day),
            ("1w", f.one_week),
            ("1m", f.one_month),
        ] {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                label,
                format_usd(value),
                pct_change(value, report.last_price)
            ));
        }

        // Models
        md.push_str("\n## Models\n\n");
        md.push_str("| Model | Status | Weight | Imputed |\n");
        md.push_str("|-------|--------|--------|---------|\n");
        for m in &report.models {
            let status = match &m.failure_reason {
                Some(reason) => format!("failed: {reason}"),
                None => "ok".to_string(),
            };
            md.push_str(&format!(
                "| {} | {} | {:.3} | {} |\n",
                m.name, status, m.weight, m.imputed_cells
            ));
        }
        if !report.blend.degraded_models.is_empty() {
            md.push_str(&format!(
                "\nImputed with last price: {}\n",
                report.blend.degraded_models.join(", ")
            ));
        }

        // Risk
        md.push_str("\n## Risk Metrics\n\n");
        for (label, value) in report.risk.entries() {
            md.push_str(&format!("- {}: {}\n", label, fmt_metric(value)));
        }
        if let Some(rolling) = &report.rolling {
            md.push_str(&format!(
                "- Rolling {}d volatility: {}\n- Rolling {}d Sharpe: {}\n",
                rolling.window,
                fmt_metric(rolling.volatility),
                rolling.window,
                fmt_metric(rolling.sharpe)
            ));
        }

        // Regime
        if let Some(p) = &report.regime_probabilities {
            md.push_str("\n## Regime Probabilities\n\n");
            md.push_str("| Bear | Sideways | Bull |\n");
            md.push_str("|------|----------|------|\n");
            md.push_str(&format!(
                "| {:.3} | {:.3} | {:.3} |\n",
                p.bear, p.sideways, p.bull
            ));
        }
        if let Some(rate) = report.funding_rate {
            md.push_str(&format!("\nFunding rate: {rate:.6}\n"));
        }

        // Monte Carlo
        if !report.hit_probabilities.is_empty() {
            md.push_str("\n## Hit Probabilities\n\n");
            if let Some(target) = report.hit_target {
                md.push_str(&format!("Target: {}\n\n", format_usd(target)));
            }
            for (h, p) in &report.hit_probabilities {
                md.push_str(&format!("- Within {}: {:.2}%\n", horizon_label(*h), p * 100.0));
            }
        }

        // Exit
        md.push_str("\n## Exit Signal\n\n");
        md.push_str(&format!(
            "**{}** with score {:.2}\n\n",
            if report.exit.signal { "EXIT" } else { "HOLD" },
            report.exit.score
        ));
        for reason in &report.exit.explanation {
            md.push_str(&format!("- {reason}\n"));
        }
        let snap = &report.exit_snapshot;
        md.push_str("\n| Input | Value |\n");
        md.push_str("|-------|-------|\n");
        md.push_str(&format!("| RSI(14) | {} |\n", fmt_metric(snap.rsi)));
        md.push_str(&format!(
            "| Recent volatility | {} |\n",
            snap.recent_volatility
                .map_or_else(|| "N/A".to_string(), |v| format!("{v:.4}"))
        ));
        md.push_str(&format!(
            "| Volatility 75th pct | {} |\n",
            snap.volatility_threshold
                .map_or_else(|| "N/A".to_string(), |v| format!("{v:.4}"))
        ));
        md.push_str(&format!(
            "| 200-day MA | {} |\n",
            snap.long_ma.map_or_else(|| "N/A".to_string(), format_usd)
        ));
        md.push_str(&format!(
            "| MACD bear crossover | {} |\n",
            if snap.macd_bear_crossover { "yes" } else { "no" }
        ));

        md
    }
}

fn pct_change(value: f64, base: f64) -> String {
    if value.is_finite() && base > 0.0 {
        format!("{:+.2}%", (value / base - 1.0) * 100.0)
    } else {
        "N/A".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_formats_sign() {
        assert_eq!(pct_change(101.0, 100.0), "+1.00%");
        assert_eq!(pct_change(99.5, 100.0), "-0.50%");
        assert_eq!(pct_change(f64::NAN, 100.0), "N/A");
        assert_eq!(pct_change(100.0, 0.0), "N/A");
    }
}
