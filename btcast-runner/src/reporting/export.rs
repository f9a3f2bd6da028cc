//! JSON and Markdown export of forecast reports.
//!
//! Persisted JSON carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::reports::MarkdownReportGenerator;
use crate::config::{ReportFormat, ReportSection};
use crate::result::{ForecastReport, SCHEMA_VERSION};

/// Files written by [`save_report`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportPaths {
    pub json: Option<PathBuf>,
    pub markdown: Option<PathBuf>,
}

/// Serialize a `ForecastReport` to pretty JSON.
pub fn export_json(report: &ForecastReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ForecastReport to JSON")
}

/// Deserialize a `ForecastReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ForecastReport> {
    let report: ForecastReport =
        serde_json::from_str(json).context("failed to deserialize ForecastReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Write the configured formats to `section.output_dir` as `forecast_{as_of}.{ext}`.
pub fn save_report(report: &ForecastReport, section: &ReportSection) -> Result<ExportPaths> {
    let dir = &section.output_dir;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report dir: {}", dir.display()))?;

    let stem = format!("forecast_{}", report.as_of);
    let mut paths = ExportPaths::default();
    for format in &section.formats {
        match format {
            ReportFormat::Json => {
                let path = dir.join(format!("{stem}.json"));
                std::fs::write(&path, export_json(report)?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                paths.json = Some(path);
            }
            ReportFormat::Markdown => {
                let path = dir.join(format!("{stem}.md"));
                std::fs::write(&path, MarkdownReportGenerator.generate(report))
                    .with_context(|| format!("failed to write {}", path.display()))?;
                paths.markdown = Some(path);
            }
        }
    }
    Ok(paths)
}

/// Load a previously saved JSON report.
pub fn load_report(path: &Path) -> Result<ForecastReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
