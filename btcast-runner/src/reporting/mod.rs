//! Report rendering and export.

pub mod export;
pub mod reports;

pub use export::{export_json, import_json, load_report, save_report, ExportPaths};
pub use reports::{format_usd, ConsoleSummary, MarkdownReportGenerator};
