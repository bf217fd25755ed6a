//! Extraction/run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document::Coordinates;
use crate::error::{ModelError, Result};

/// Settings for one conversion run, usually loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub extraction_name: String,
    /// Path to the mapping configuration JSON.
    pub mapping: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub separator: String,
    pub producer_id: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Source IANA zone, e.g. `Europe/Rome`.
    #[serde(alias = "csv_timezone")]
    pub time_zone: Option<String>,
    /// Fixed target offset, e.g. `+2`. Blank means UTC.
    pub target_offset: String,
    pub handle_ambiguity: bool,
    pub slot_mode: bool,
    pub allow_single_overlap: bool,
    /// Maximum records per output document, 0 for unlimited.
    pub max_rows_per_document: usize,
    pub move_completed: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            extraction_name: String::new(),
            mapping: PathBuf::new(),
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            separator: ";".to_string(),
            producer_id: None,
            coordinates: None,
            time_zone: None,
            target_offset: String::new(),
            handle_ambiguity: false,
            slot_mode: false,
            allow_single_overlap: false,
            max_rows_per_document: 0,
            move_completed: true,
        }
    }
}

impl RunConfig {
    /// The field separator as a single byte.
    pub fn separator_byte(&self) -> Result<u8> {
        let mut chars = self.separator.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii() => Ok(ch as u8),
            _ => Err(ModelError::InvalidSeparator {
                value: self.separator.clone(),
            }),
        }
    }

    /// Producer id, ignoring blank values.
    pub fn producer(&self) -> Option<&str> {
        self.producer_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Resolve relative paths against the directory holding the config file.
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        for path in [&mut self.mapping, &mut self.source_dir, &mut self.output_dir] {
            if path.is_relative() && !path.as_os_str().is_empty() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// Load a run configuration from a TOML file.
///
/// Relative paths inside the file are resolved against its parent directory.
pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    let config: RunConfig = toml::from_str(&content).map_err(|source| ModelError::RunToml {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.relative_to(base))
}
