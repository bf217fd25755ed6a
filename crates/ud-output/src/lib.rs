//! Output generation for converted datasets.
//!
//! - **header**: specification/context finalization for a run
//! - **partition**: splitting records into documents of bounded size
//! - **naming**: deterministic document file names
//! - **writer**: JSON rendering and writing of documents
//! - **report**: the per-run `conversion-report.json`

mod error;
mod header;
mod naming;
mod partition;
mod report;
mod writer;

pub use error::{OutputError, Result};
pub use header::{DocumentHeader, HeaderOptions, generation_stamp, resolve_producer_id};
pub use naming::{UNKNOWN_PRODUCER, document_file_name, sanitize_producer_id};
pub use partition::{part_count, partition_records};
pub use report::{
    FileReport, FileStatus, REPORT_FILE_NAME, REPORT_SCHEMA, REPORT_SCHEMA_VERSION,
    write_conversion_report,
};
pub use writer::{build_documents, render_document, write_documents};
