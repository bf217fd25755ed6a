use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading mapping or run configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mapping configuration {path}: {source}")]
    MappingJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid run configuration {path}: {source}")]
    RunToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("separator must be a single ASCII character, got '{value}'")]
    InvalidSeparator { value: String },

    #[error("mapping configuration {path} declares no mappings")]
    EmptyMappings { path: PathBuf },
}

impl ModelError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
