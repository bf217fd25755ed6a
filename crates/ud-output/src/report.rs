//! Run-level conversion report.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use ud_transform::DropEntry;

use crate::error::{OutputError, Result};

pub const REPORT_SCHEMA: &str = "ud-transpiler.conversion-report";
pub const REPORT_SCHEMA_VERSION: u32 = 1;
pub const REPORT_FILE_NAME: &str = "conversion-report.json";

/// How the conversion of one source ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Converted,
    /// Records were assembled but every one was dropped.
    AllDropped,
    Failed,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Converted => "converted",
            Self::AllDropped => "all dropped",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub status: FileStatus,
    pub rows_read: usize,
    pub records_emitted: usize,
    pub documents: Vec<PathBuf>,
    pub unmatched_headers: Vec<String>,
    pub dropped: Vec<DropEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    /// Report for a file whose conversion failed before any output.
    pub fn failed(source: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sha256: None,
            status: FileStatus::Failed,
            rows_read: 0,
            records_emitted: 0,
            documents: Vec::new(),
            unmatched_headers: Vec::new(),
            dropped: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn documents_written(&self) -> usize {
        self.documents.len()
    }
}

#[derive(Serialize)]
struct ReportPayload<'a> {
    schema: &'static str,
    schema_version: u32,
    generated_at: String,
    extraction_name: &'a str,
    files: Vec<FileEntry<'a>>,
}

#[derive(Serialize)]
struct FileEntry<'a> {
    #[serde(flatten)]
    report: &'a FileReport,
    documents_written: usize,
    dropped_count: usize,
}

/// Write `conversion-report.json` into `output_dir`.
pub fn write_conversion_report(
    output_dir: &Path,
    extraction_name: &str,
    generated_at: DateTime<Utc>,
    files: &[FileReport],
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| OutputError::create_dir(output_dir, e))?;
    let output_path = output_dir.join(REPORT_FILE_NAME);
    let payload = ReportPayload {
        schema: REPORT_SCHEMA,
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: generated_at.to_rfc3339(),
        extraction_name,
        files: files
            .iter()
            .map(|report| FileEntry {
                report,
                documents_written: report.documents_written(),
                dropped_count: report.dropped.len(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&payload).map_err(|source| OutputError::Serialize {
        what: "conversion report",
        source,
    })?;
    std::fs::write(&output_path, format!("{json}\n"))
        .map_err(|e| OutputError::write(&output_path, e))?;
    Ok(output_path)
}
