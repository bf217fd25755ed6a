use std::path::PathBuf;

use ud_output::{FileReport, FileStatus};

/// Outcome of a `convert` run.
#[derive(Debug)]
pub struct RunResult {
    pub extraction_name: String,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub files: Vec<FileReport>,
    /// Path of `conversion-report.json`; `None` on dry runs.
    pub report: Option<PathBuf>,
    pub dry_run: bool,
    pub has_errors: bool,
}

impl RunResult {
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|file| file.status == FileStatus::Failed)
    }
}

/// How one header cell resolves against the mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    pub position: usize,
    pub header: String,
    /// Canonical name, `None` when no rule matches.
    pub canonical: Option<String>,
    pub negative: Option<String>,
    pub function: Option<String>,
    pub coordinates: bool,
    /// Configured as a date or period column.
    pub period_role: Option<&'static str>,
}
