//! Sign-filtered values of one source row.

use std::collections::BTreeMap;

use ud_model::RawRecord;

use crate::header::{Branch, HeaderIndex};

/// Literal produced for the branch of a sign-split column that does not apply.
pub const NULL_BRANCH: &str = "null";

/// Canonical name to raw (unmapped) cell value.
pub type LineValues = BTreeMap<String, String>;

/// Read every canonical name of `index` from `record`.
///
/// For sign-split columns the primary name receives the cell only when it does
/// not start with `-`, the companion only when it does; the other branch gets
/// `"null"`. Names spanning several columns keep the last column's value.
pub fn line_values(index: &HeaderIndex, record: &RawRecord) -> LineValues {
    let mut line = LineValues::new();
    for (name, branch, positions) in index.iter() {
        for &position in positions {
            let raw = record.cell(position);
            let negative = raw.starts_with('-');
            let value = match branch {
                Branch::Plain => raw,
                Branch::Positive if !negative => raw,
                Branch::Negative if negative => raw,
                Branch::Positive | Branch::Negative => NULL_BRANCH,
            };
            line.insert(name.to_string(), value.to_string());
        }
    }
    line
}
