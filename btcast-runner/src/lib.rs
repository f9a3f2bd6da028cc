//! BTCast Runner: pipeline orchestration around `btcast-core`.
//!
//! This crate provides:
//! - TOML pipeline configuration with per-regime weight overrides
//! - Price history CSV and model outputs JSON loading, plus a seeded synthetic history
//! - The four-stage pipeline (history, risk, blend, exit) producing a `ForecastReport`
//! - JSON and Markdown export and a console summary

pub mod config;
pub mod data_loader;
pub mod reporting;
pub mod result;
pub mod runner;

pub use config::{ConfigError, PipelineConfig, ReportFormat};
pub use data_loader::{
    generate_synthetic_history, load_history, load_model_outputs, LoadError, ModelOutputs,
};
pub use reporting::{
    export_json, import_json, load_report, save_report, ConsoleSummary, ExportPaths,
    MarkdownReportGenerator,
};
pub use result::{ForecastReport, ModelStatus, RiskSummary, RollingSummary, SCHEMA_VERSION};
pub use runner::{run_from_files, run_pipeline, run_synthetic, PipelineInputs, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn input_types_are_send_sync() {
        assert_send::<ModelOutputs>();
        assert_sync::<ModelOutputs>();
        assert_send::<PipelineInputs>();
        assert_sync::<PipelineInputs>();
    }

    #[test]
    fn forecast_report_is_send_sync() {
        assert_send::<ForecastReport>();
        assert_sync::<ForecastReport>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
