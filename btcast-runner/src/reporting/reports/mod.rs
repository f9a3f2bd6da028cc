//! Report generators.

mod markdown;
mod summary;

pub use markdown::MarkdownReportGenerator;
pub use summary::{format_usd, ConsoleSummary};

/// Two decimals, or `N/A` for an undefined metric.
pub(crate) fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

/// Horizon in days as a short label: `1d`, `7d`, ...
pub(crate) fn horizon_label(days: u32) -> String {
    format!("{days}d")
}
