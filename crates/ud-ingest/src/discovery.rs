//! Source discovery and completed-file handling.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{IngestError, Result};

/// Directory, relative to the source directory, receiving converted files.
pub const COMPLETED_DIR: &str = "completed";

/// Kind of source file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    JsonFeed,
}

/// Classify a path by its extension (case-insensitive).
pub fn source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    if ext.eq_ignore_ascii_case("csv") {
        Some(SourceKind::Csv)
    } else if ext.eq_ignore_ascii_case("json") {
        Some(SourceKind::JsonFeed)
    } else {
        None
    }
}

/// Lists all CSV and JSON sources in a directory.
///
/// Returns files sorted by filename.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() && source_kind(&path).is_some() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Move a converted source into `completed/` next to it.
///
/// Returns the new location.
pub fn move_to_completed(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let completed = parent.join(COMPLETED_DIR);
    std::fs::create_dir_all(&completed).map_err(|e| IngestError::DirectoryRead {
        path: completed.clone(),
        source: e,
    })?;
    let file_name = path.file_name().unwrap_or(path.as_os_str());
    let target = completed.join(file_name);
    std::fs::rename(path, &target).map_err(|e| IngestError::FileMove {
        from: path.to_path_buf(),
        to: target.clone(),
        source: e,
    })?;
    info!(from = %path.display(), to = %target.display(), "moved converted source");
    Ok(target)
}
