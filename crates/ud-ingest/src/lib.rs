//! Source ingestion for the dataset transpiler.
//!
//! - **Tables**: delimited CSV with a configurable single-byte separator
//! - **Feeds**: JSON documents carrying a `result` array of flat objects
//! - **Discovery**: sorted source listing and completed-file handling
//! - **Checksums**: SHA-256 of source bytes for the conversion report

mod csv_table;
mod discovery;
mod error;
mod hash;
mod json_feed;

pub use csv_table::{ReadFailure, SourceTable, read_source_table, read_source_table_from_reader};
pub use discovery::{SourceKind, list_source_files, move_to_completed, source_kind};
pub use error::{IngestError, Result};
pub use hash::{sha256_file, sha256_hex};
pub use json_feed::{FeedFailure, FeedObject, parse_json_feed, read_json_feed};
