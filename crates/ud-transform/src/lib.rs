//! Dataset transformation engine.
//!
//! - **datetime**: timestamp layout detection, merging and minute arithmetic
//! - **offset**: target UTC offsets, offset labels and source zones
//! - **period**: start/end construction from range, instant and slot layouts
//! - **normalize**: two-pass DST-aware normalization into a fixed offset
//! - **assemble**: record assembly with coordinates and null-field defaults
//! - **slots**: two-row daily profiles and slot-duration harmonization
//! - **feed**: JSON feed objects to records
//! - **convert**: the per-table pipeline tying the above together

pub mod assemble;
pub mod convert;
pub mod datetime;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod offset;
pub mod period;
pub mod slots;

pub use assemble::RowAssembler;
pub use convert::{ConversionOptions, ConversionOutcome, convert_table};
pub use error::{ConvertError, Result};
pub use feed::convert_feed;
pub use normalize::{
    DropEntry, DropReason, NormalizationContext, NormalizationOutcome, collect_timestamps,
    normalize_periods, parse_explicit, resolve_timestamps,
};
pub use offset::{offset_label, parse_offset, parse_zone, target_offset};
pub use period::{build_period, enforce_slice_duration};
