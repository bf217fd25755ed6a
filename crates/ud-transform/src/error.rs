//! File-level conversion errors.

use thiserror::Error;

/// Defects that abort the conversion of a whole file.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source has no header cells.
    #[error("source header is empty")]
    EmptyHeader,

    /// No header cell matches a mapping rule.
    #[error("none of the {columns} header cells matches a mapping rule")]
    NoMappedColumns { columns: usize },

    /// Slot mode needs at least one configured period column in the header.
    #[error("slot mode requested but none of the period columns {configured:?} is in the header")]
    MissingSlotColumns { configured: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
