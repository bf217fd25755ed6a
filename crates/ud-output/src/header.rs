//! Specification and context blocks shared by every document of a run.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};

use ud_model::{Context, Coordinates, Identifier, Producer, PropertyConfig, Specification};

/// Layout of the context timestamp and of document names.
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Run-level values stamped onto the templates.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderOptions {
    pub producer_id: String,
    pub coordinates: Option<Coordinates>,
    pub target: FixedOffset,
    /// Label written as the context time zone, e.g. `UTC+2`.
    pub offset_label: String,
    pub generated_at: DateTime<Utc>,
}

/// Finalized specification and context.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    pub specification: Specification,
    pub context: Context,
}

impl DocumentHeader {
    /// Copy the templates of `config` and stamp the run values onto them.
    pub fn finalize(config: &PropertyConfig, options: &HeaderOptions) -> Self {
        let mut specification = config.specification.clone();
        specification
            .id
            .get_or_insert_with(Identifier::default)
            .value = Some(options.producer_id.clone());

        let mut context = config.context.clone();
        context
            .producer
            .get_or_insert_with(Producer::default)
            .id = Some(options.producer_id.clone());
        if let Some(coordinates) = &options.coordinates {
            context.coordinates = Some(coordinates.clone());
        }
        context.time_zone = Some(options.offset_label.clone());
        context.timestamp = Some(generation_stamp(options.generated_at, options.target));

        Self {
            specification,
            context,
        }
    }
}

/// `yyyyMMddHHmmss` of `instant` in the target offset.
pub fn generation_stamp(instant: DateTime<Utc>, target: FixedOffset) -> String {
    instant.with_timezone(&target).format(STAMP_FORMAT).to_string()
}

/// The configured producer id, else the last segment of the source directory.
pub fn resolve_producer_id(configured: Option<&str>, source_dir: &Path) -> String {
    configured
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| {
            source_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_default()
}
