use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::analysis::AnalysisResult;

/// One asset that was optimized.
#[derive(Debug, Clone, Serialize)]
pub struct AssetChange {
    pub index: usize,
    pub name: String,
    /// Set when the asset was renamed (format change)
    pub new_name: Option<String>,
    pub analysis: AnalysisResult,
    pub size_before: u64,
    pub size_after: u64,
    /// Level data references rewritten to the new name
    pub references_patched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Analyze,
    Apply,
}

/// One asset that was skipped because of an error.
#[derive(Debug, Clone, Serialize)]
pub struct AssetFailure {
    pub name: String,
    pub stage: FailureStage,
    pub error: String,
}

/// Everything a run changed, written with `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeReport {
    pub generated_at: DateTime<Local>,
    pub input: String,
    pub output: PathBuf,
    pub backup: Option<PathBuf>,
    pub size_before: u64,
    pub size_after: u64,
    pub changes: Vec<AssetChange>,
    pub failures: Vec<AssetFailure>,
}

impl OptimizeReport {
    /// Number of optimizations that were applied successfully.
    pub fn applied(&self) -> usize {
        self.changes.len()
    }
}

/// Write the report as pretty-printed JSON.
pub fn write_report(report: &OptimizeReport, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
