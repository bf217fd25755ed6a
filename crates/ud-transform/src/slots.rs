//! Slot mode: two-row daily profiles.
//!
//! Rows sharing a date cell form one day. The two rows model the two
//! occurrences of a repeated local time on a DST fall-back day, so each slot
//! column may produce zero, one or two records.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::warn;

use ud_map::parse_number;
use ud_model::{RawRecord, ResolvedRecord, renumber};

use crate::datetime::{add_minutes, minutes_between, parse_any};

/// Slot duration assumed when none can be observed.
pub const DEFAULT_SLOT_MINUTES: i64 = 15;

/// Up to two rows sharing one date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDay<'a> {
    pub date: &'a str,
    pub first: &'a RawRecord,
    pub second: Option<&'a RawRecord>,
}

/// Group rows by date cell, in first-seen order.
///
/// Rows with a blank date are skipped. Days with more than two rows keep the
/// first two.
pub fn group_slot_days(rows: &[RawRecord], date_column: usize) -> Vec<SlotDay<'_>> {
    let mut days: Vec<(&str, Vec<&RawRecord>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let date = row.cell(date_column);
        if date.trim().is_empty() {
            continue;
        }
        match positions.get(date) {
            Some(&position) => days[position].1.push(row),
            None => {
                positions.insert(date, days.len());
                days.push((date, vec![row]));
            }
        }
    }
    days.into_iter()
        .filter_map(|(date, day_rows)| {
            if day_rows.len() > 2 {
                warn!(
                    date = %date,
                    rows = day_rows.len(),
                    discarded = day_rows.len() - 2,
                    "more than two rows for one date in slot mode, keeping the first two"
                );
            }
            let mut iter = day_rows.into_iter();
            let first = iter.next()?;
            Some(SlotDay {
                date,
                first,
                second: iter.next(),
            })
        })
        .collect()
}

/// True when a slot cell carries data.
///
/// Blank cells and numeric zero are empty; anything that is not a number
/// counts as present.
pub fn has_value(raw: Option<&str>) -> bool {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return false;
    };
    match parse_number(&raw.replace(',', ".")) {
        Some(number) => number != 0.0,
        None => true,
    }
}

fn slot_cell(row: &RawRecord, column: usize) -> Option<&str> {
    row.fields.get(column).map(String::as_str)
}

/// Rows of a day that produce a record for one slot column, in output order.
pub fn slot_sources<'a>(day: &SlotDay<'a>, column: usize) -> Vec<&'a RawRecord> {
    let first_has = has_value(slot_cell(day.first, column));
    let second = day
        .second
        .filter(|row| has_value(slot_cell(row, column)));
    match (first_has, second) {
        (true, Some(second)) => vec![day.first, second],
        (false, Some(second)) => vec![second],
        (true, None) | (false, None) => vec![day.first],
    }
}

fn start_of(record: &ResolvedRecord) -> Option<NaiveDateTime> {
    record
        .period
        .as_ref()
        .and_then(|period| period.start.as_deref())
        .and_then(parse_any)
}

/// Smallest positive start-to-end distance in minutes.
pub fn infer_slot_minutes(records: &[ResolvedRecord]) -> i64 {
    records
        .iter()
        .filter_map(|record| {
            let period = record.period.as_ref()?;
            minutes_between(period.start.as_deref()?, period.end.as_deref()?)
        })
        .filter(|minutes| *minutes > 0)
        .min()
        .unwrap_or(DEFAULT_SLOT_MINUTES)
}

/// Harmonize slot durations after normalization.
///
/// Every end becomes `start + duration` (`slice` when positive, otherwise the
/// inferred duration); records are sorted by start with unparsable starts
/// last, then renumbered from 1.
pub fn harmonize_slots(records: &mut [ResolvedRecord], slice: i32) {
    let minutes = if slice > 0 {
        i64::from(slice)
    } else {
        infer_slot_minutes(records)
    };
    for record in records.iter_mut() {
        if let Some(period) = record.period.as_mut()
            && let Some(end) = period.start.as_deref().and_then(|start| add_minutes(start, minutes))
        {
            period.end = Some(end);
        }
    }
    records.sort_by_key(|record| {
        let start = start_of(record);
        (start.is_none(), start)
    });
    renumber(records);
}
