//! Splitting records into bounded documents.

use ud_model::{ResolvedRecord, renumber};

/// Number of documents for `total` records at `max_rows` per document.
///
/// `max_rows == 0` means unlimited. There is always at least one part.
pub fn part_count(total: usize, max_rows: usize) -> usize {
    if max_rows == 0 {
        1
    } else {
        total.div_ceil(max_rows).max(1)
    }
}

/// Split `records` into contiguous chunks, renumbering ids from 1 in each.
pub fn partition_records(records: Vec<ResolvedRecord>, max_rows: usize) -> Vec<Vec<ResolvedRecord>> {
    if max_rows == 0 || records.len() <= max_rows {
        let mut single = records;
        renumber(&mut single);
        return vec![single];
    }
    let mut parts = Vec::with_capacity(part_count(records.len(), max_rows));
    let mut remaining = records.into_iter().peekable();
    while remaining.peek().is_some() {
        let mut chunk: Vec<ResolvedRecord> = remaining.by_ref().take(max_rows).collect();
        renumber(&mut chunk);
        parts.push(chunk);
    }
    parts
}
