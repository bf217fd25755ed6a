use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};

/// A parsed delimited source: one header row and its data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read a delimited file. The first non-blank record is the header.
pub fn read_source_table(path: &Path, separator: u8) -> Result<SourceTable> {
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    read_source_table_from_reader(file, separator).map_err(|error| match error {
        ReadFailure::Csv(source) => IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        },
        ReadFailure::Empty => IngestError::EmptySource {
            path: path.to_path_buf(),
        },
    })
    .inspect(|table| {
        debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "read source table"
        );
    })
}

/// Failure reading a table from an anonymous reader.
#[derive(Debug)]
pub enum ReadFailure {
    Csv(csv::Error),
    Empty,
}

/// Read a delimited table from any reader.
pub fn read_source_table_from_reader<R: Read>(
    reader: R,
    separator: u8,
) -> std::result::Result<SourceTable, ReadFailure> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(separator)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(ReadFailure::Csv)?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match headers {
            None => headers = Some(record.iter().map(normalize_header).collect()),
            Some(_) => rows.push(record.iter().map(normalize_cell).collect()),
        }
    }
    let headers = headers.ok_or(ReadFailure::Empty)?;
    Ok(SourceTable { headers, rows })
}
