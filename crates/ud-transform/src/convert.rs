//! Per-table conversion: header resolution, row assembly, normalization.

use tracing::{debug, info, warn};

use ud_ingest::SourceTable;
use ud_map::{HeaderIndex, column_positions};
use ud_model::{PeriodConfig, PropertyConfig, RawRecord, ResolvedRecord, renumber};

use crate::assemble::RowAssembler;
use crate::error::{ConvertError, Result};
use crate::normalize::{DropEntry, NormalizationContext, normalize_periods};
use crate::period::{build_period, enforce_slice_duration};
use crate::slots::{group_slot_days, harmonize_slots, slot_sources};

/// Settings for converting one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub period: PeriodConfig,
    pub normalization: NormalizationContext,
}

impl ConversionOptions {
    /// Options whose normalization keys follow the period slice.
    pub fn new(period: PeriodConfig, normalization: NormalizationContext) -> Self {
        let keys = NormalizationContext::keys_for_slice(period.slice);
        Self {
            period,
            normalization: normalization.with_keys(keys),
        }
    }
}

/// Result of converting one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOutcome {
    pub records: Vec<ResolvedRecord>,
    pub dropped: Vec<DropEntry>,
    pub rows_read: usize,
    /// Records assembled before normalization.
    pub candidates: usize,
    pub unmatched_headers: Vec<String>,
}

impl ConversionOutcome {
    /// True when records were assembled but normalization kept none.
    pub fn all_dropped(&self) -> bool {
        self.candidates > 0 && self.records.is_empty()
    }
}

/// Resolved column layout of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    date_column: Option<usize>,
    period_columns: Vec<usize>,
}

impl Layout {
    fn resolve(headers: &[String], period: &PeriodConfig) -> Self {
        let date_column = period.date_column.as_deref().and_then(|name| {
            let found = column_positions(headers, name).first().copied();
            if found.is_none() {
                warn!(column = %name, "configured date column not found in header");
            }
            found
        });
        let period_columns = period
            .period_columns
            .iter()
            .flat_map(|name| {
                let positions = column_positions(headers, name);
                if positions.is_empty() {
                    debug!(column = %name, "configured period column not found in header");
                }
                positions
            })
            .collect();
        Self {
            date_column,
            period_columns,
        }
    }
}

/// Convert a parsed table into normalized records.
pub fn convert_table(
    config: &PropertyConfig,
    table: &SourceTable,
    options: &ConversionOptions,
) -> Result<ConversionOutcome> {
    if table.headers.iter().all(|header| header.is_empty()) {
        return Err(ConvertError::EmptyHeader);
    }
    let index = HeaderIndex::build(&table.headers, config);
    if index.is_empty() {
        return Err(ConvertError::NoMappedColumns {
            columns: table.headers.len(),
        });
    }
    if !index.unmatched().is_empty() {
        info!(
            unmatched = index.unmatched().len(),
            mapped = index.len(),
            "header cells without mapping rule ignored"
        );
    }

    let rows: Vec<RawRecord> = table
        .rows
        .iter()
        .enumerate()
        .map(|(position, fields)| RawRecord::new(position + 1, fields.clone()))
        .collect();
    let layout = Layout::resolve(&table.headers, &options.period);
    if options.period.slot_mode
        && !options.period.period_columns.is_empty()
        && layout.period_columns.is_empty()
    {
        return Err(ConvertError::MissingSlotColumns {
            configured: options.period.period_columns.clone(),
        });
    }
    let assembler = RowAssembler::new(config, &index);
    let candidates = assemble_records(&assembler, &table.headers, &rows, &layout, &options.period);
    let candidate_count = candidates.len();

    let normalized = normalize_periods(candidates, &options.normalization);
    let mut records = normalized.records;
    let slice = options.period.slice;
    if options.period.slot_mode {
        harmonize_slots(&mut records, slice);
    } else {
        if slice > 0 {
            for period in records.iter_mut().filter_map(|record| record.period.as_mut()) {
                enforce_slice_duration(period, slice);
            }
        }
        renumber(&mut records);
    }

    let outcome = ConversionOutcome {
        records,
        dropped: normalized.dropped,
        rows_read: rows.len(),
        candidates: candidate_count,
        unmatched_headers: index.unmatched().to_vec(),
    };
    if outcome.all_dropped() {
        warn!(
            candidates = outcome.candidates,
            "every record of the source was dropped"
        );
    }
    Ok(outcome)
}

fn assemble_records(
    assembler: &RowAssembler<'_>,
    headers: &[String],
    rows: &[RawRecord],
    layout: &Layout,
    period: &PeriodConfig,
) -> Vec<ResolvedRecord> {
    let mut records = Vec::new();
    let mut next_id = 1;

    if layout.period_columns.is_empty() {
        for row in rows {
            records.push(assembler.assemble(next_id, row, None, None));
            next_id += 1;
        }
        return records;
    }

    if period.slot_mode
        && let Some(date_column) = layout.date_column
    {
        for day in group_slot_days(rows, date_column) {
            for &column in &layout.period_columns {
                let header = headers[column].as_str();
                for source in slot_sources(&day, column) {
                    let built = build_period(
                        Some(day.date),
                        header,
                        source.fields.get(column).map(String::as_str),
                        period.slice,
                    );
                    records.push(assembler.assemble(next_id, source, built, Some(column)));
                    next_id += 1;
                }
            }
        }
        return records;
    }

    let multi_column = layout.period_columns.len() > 1;
    for row in rows {
        let date = layout.date_column.map(|column| row.cell(column));
        if date.is_some_and(|date| date.trim().is_empty()) {
            continue;
        }
        for &column in &layout.period_columns {
            let header = headers[column].as_str();
            let built = build_period(date, header, row.fields.get(column).map(String::as_str), period.slice);
            if built.is_none() {
                debug!(id = next_id, column = %header, "no period derived for cell");
            }
            let leading = multi_column.then_some(column);
            records.push(assembler.assemble(next_id, row, built, leading));
            next_id += 1;
        }
    }
    records
}
