//! JSON rendering and writing of dataset documents.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ud_model::{DatasetDocument, ResolvedRecord};

use crate::error::{OutputError, Result};
use crate::header::DocumentHeader;
use crate::naming::document_file_name;
use crate::partition::partition_records;

/// One document per partition, each carrying the shared header.
pub fn build_documents(
    header: &DocumentHeader,
    records: Vec<ResolvedRecord>,
    max_rows: usize,
) -> Vec<DatasetDocument> {
    partition_records(records, max_rows)
        .into_iter()
        .map(|chunk| {
            DatasetDocument::new(header.specification.clone(), header.context.clone(), chunk)
        })
        .collect()
}

/// Pretty-printed JSON with a trailing newline.
pub fn render_document(document: &DatasetDocument) -> Result<String> {
    let json = serde_json::to_string_pretty(document).map_err(|source| OutputError::Serialize {
        what: "dataset document",
        source,
    })?;
    Ok(format!("{json}\n"))
}

/// Write `documents` into `output_dir` and return the written paths.
pub fn write_documents(
    output_dir: &Path,
    producer: &str,
    stamp: &str,
    documents: &[DatasetDocument],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|e| OutputError::create_dir(output_dir, e))?;
    let numbered = documents.len() > 1;
    let mut written = Vec::with_capacity(documents.len());
    for (index, document) in documents.iter().enumerate() {
        let name = document_file_name(producer, stamp, numbered.then_some(index + 1));
        let path = output_dir.join(name);
        let content = render_document(document)?;
        std::fs::write(&path, content).map_err(|e| OutputError::write(&path, e))?;
        debug!(
            path = %path.display(),
            records = document.records().len(),
            "wrote dataset document"
        );
        written.push(path);
    }
    info!(documents = written.len(), dir = %output_dir.display(), "documents written");
    Ok(written)
}
