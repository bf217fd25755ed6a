//! Document file names.

/// Producer id used when none is available.
pub const UNKNOWN_PRODUCER: &str = "unknown-resource";

const FORBIDDEN: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replace characters not allowed in file names with `-`.
pub fn sanitize_producer_id(producer: &str) -> String {
    let trimmed = producer.trim();
    if trimmed.is_empty() {
        return UNKNOWN_PRODUCER.to_string();
    }
    trimmed
        .chars()
        .map(|ch| if FORBIDDEN.contains(&ch) { '-' } else { ch })
        .collect()
}

/// `[<producer>]_-_[<stamp>].json`, with `_<part>` when a run writes several parts.
pub fn document_file_name(producer: &str, stamp: &str, part: Option<usize>) -> String {
    let producer = sanitize_producer_id(producer);
    match part {
        Some(part) => format!("[{producer}]_-_[{stamp}]_{part}.json"),
        None => format!("[{producer}]_-_[{stamp}].json"),
    }
}
