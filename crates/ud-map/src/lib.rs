//! Mapping resolution for source tables.
//!
//! - [`header`]: builds the [`HeaderIndex`] from a source header and the mapping rules
//! - [`values`]: applies value functions to raw cells
//! - [`line`]: sign-filtered per-row values keyed by canonical name

#![deny(unsafe_code)]

pub mod header;
pub mod line;
pub mod values;

pub use header::{Branch, HeaderIndex, column_positions};
pub use line::{LineValues, line_values};
pub use values::{ValueEngine, is_plain_decimal, parse_number};
