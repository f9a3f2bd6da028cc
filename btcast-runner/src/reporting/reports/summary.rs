//! Plain-text console summary of a forecast report.

use std::fmt::Write as _;

use super::{fmt_metric, horizon_label};
use crate::result::ForecastReport;

/// Renders the console summary printed after a run.
pub struct ConsoleSummary;

impl ConsoleSummary {
    pub fn render(&self, report: &ForecastReport) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_into(&mut out, report);
        out
    }

    fn write_into(&self, out: &mut String, report: &ForecastReport) -> std::fmt::Result {
        writeln!(out, "===== BTC Quant Pipeline Summary =====")?;
        writeln!(
            out,
            "Last price: {} ({})",
            format_usd(report.last_price),
            report.last_date
        )?;
        if report.spot_appended {
            writeln!(out, "Realtime price appended for {}", report.as_of)?;
        }
        if report.has_synthetic {
            writeln!(out, "WARNING: synthetic price history")?;
        }

        writeln!(out, "\n-- Risk Metrics --")?;
        for (label, value) in report.risk.entries() {
            writeln!(out, "{label:<15}: {}", fmt_metric(value))?;
        }
        if let Some(rolling) = &report.rolling {
            writeln!(
                out,
                "{:<15}: vol {} / sharpe {}",
                format!("Rolling {}d", rolling.window),
                fmt_metric(rolling.volatility),
                fmt_metric(rolling.sharpe)
            )?;
        }

        writeln!(out, "\n-- Regime --")?;
        writeln!(out, "Current regime: {}", report.regime)?;
        if let Some(p) = &report.regime_probabilities {
            writeln!(
                out,
                "Regime probabilities: [{:.3}, {:.3}, {:.3}] (order: bear/sideways/bull)",
                p.bear, p.sideways, p.bull
            )?;
        }

        writeln!(out, "\n-- Models --")?;
        for m in &report.models {
            match &m.failure_reason {
                Some(reason) => writeln!(out, "{:<8} FAILED ({reason})", m.name)?,
                None if m.imputed_cells > 0 => writeln!(
                    out,
                    "{:<8} ok, weight {:.3}, {} horizon(s) imputed",
                    m.name, m.weight, m.imputed_cells
                )?,
                None => writeln!(out, "{:<8} ok, weight {:.3}", m.name, m.weight)?,
            }
        }
        if let Some(vol) = &report.volatility_forecast {
            let joined: Vec<String> = vol.iter().map(|v| format!("{v:.2}")).collect();
            writeln!(out, "Volatility forecast (percent): [{}]", joined.join(", "))?;
        }

        if !report.hit_probabilities.is_empty() {
            match report.hit_target {
                Some(target) => writeln!(
                    out,
                    "\n-- Monte Carlo: Prob. hit {} --",
                    format_usd(target)
                )?,
                None => writeln!(out, "\n-- Monte Carlo: Hit Probabilities --")?,
            }
            for (h, p) in &report.hit_probabilities {
                writeln!(out, "Within {:>3}: {:.2}%", horizon_label(*h), p * 100.0)?;
            }
        }

        writeln!(out, "\n-- Ensemble Blended Forecasts --")?;
        let f = &report.blend.forecast;
        for (label, value) in [
            ("1h", f.one_hour),
            ("1d", f.one_day),
            ("1w", f.one_week),
            ("1m", f.one_month),
        ] {
            writeln!(out, "{label:>2}: {}", format_price(value))?;
        }

        writeln!(out, "\n-- Exit Signal --")?;
        writeln!(
            out,
            "Signal: {} (score={:.2})",
            if report.exit.signal { "EXIT" } else { "HOLD" },
            report.exit.score
        )?;
        writeln!(out, "Reasons: {}", report.exit.explanation_line())?;
        Ok(())
    }
}

/// `$1,234.56`; non-finite and non-positive prices print `N/A`.
fn format_price(value: f64) -> String {
    if value.is_finite() && value > 0.0 {
        format_usd(value)
    } else {
        "N/A".to_string()
    }
}

/// Dollar amount with thousands separators and two decimals.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_groups_thousands() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(999.994), "$999.99");
        assert_eq!(format_usd(1_000.0), "$1,000.00");
        assert_eq!(format_usd(100_041.666), "$100,041.67");
        assert_eq!(format_usd(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_usd(-2_500.5), "-$2,500.50");
    }

    #[test]
    fn usd_handles_non_finite() {
        assert_eq!(format_usd(f64::NAN), "N/A");
        assert_eq!(format_usd(f64::INFINITY), "N/A");
    }

    #[test]
    fn price_rejects_zero() {
        assert_eq!(format_price(0.0), "N/A");
        assert_eq!(format_price(99_000.0), "$99,000.00");
    }
}
