//! Period construction from heterogeneous source layouts.
//!
//! The layout is selected by `slice`:
//!
//! - `slice < 0`: the period header encodes an explicit `HH:mm-HH:mm` range
//! - `slice == 0`: instantaneous; a range header still expands, otherwise the
//!   date and period cells are merged into one timestamp
//! - `slice > 0`: the first integer in the header is a slot index;
//!   `end = index * slice` minutes after midnight and `start = end - slice`
//!
//! With `slice > 0` the end is always recomputed as `start + slice` minutes.

use tracing::debug;

use ud_model::Period;

use crate::datetime::{add_minutes, merge_date_and_time, minutes_to_timestamp};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parse `H:mm` into minutes after midnight. `24:00` is accepted.
fn clock_minutes(value: &str) -> Option<i64> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: i64 = hours.trim().parse().ok()?;
    let minutes: i64 = minutes.trim().parse().ok()?;
    if !(0..60).contains(&minutes) || !(0..=24).contains(&hours) {
        return None;
    }
    let total = hours * 60 + minutes;
    (total <= MINUTES_PER_DAY).then_some(total)
}

/// Parse an `HH:mm-HH:mm` range header into minute offsets.
///
/// An end before the start rolls onto the next day.
pub fn parse_range(header: &str) -> Option<(i64, i64)> {
    if !header.contains(':') {
        return None;
    }
    let mut parts = header.split('-');
    let (start, end) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let start = clock_minutes(start)?;
    let mut end = clock_minutes(end)?;
    if end < start {
        end += MINUTES_PER_DAY;
    }
    Some((start, end))
}

/// First run of ASCII digits in `header`.
pub fn slot_index(header: &str) -> Option<i64> {
    let start = header.find(|c: char| c.is_ascii_digit())?;
    let digits: String = header[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn range_period(date: Option<&str>, start: i64, end: i64) -> Option<Period> {
    let date = date?;
    Some(Period::new(
        minutes_to_timestamp(date, start)?,
        minutes_to_timestamp(date, end)?,
    ))
}

fn merged_period(date: Option<&str>, value: Option<&str>) -> Option<Period> {
    merge_date_and_time(date, value).map(Period::instant)
}

/// Build the period of one source cell.
///
/// `date` is the row's date cell, `header` the period column header and
/// `value` the period cell. Returns `None` when no timestamp can be derived.
pub fn build_period(
    date: Option<&str>,
    header: &str,
    value: Option<&str>,
    slice: i32,
) -> Option<Period> {
    let slice = i64::from(slice);
    let period = if slice < 0 {
        match parse_range(header) {
            Some((start, end)) => range_period(date, start, end),
            None => {
                debug!(header = %header, "period header is not a time range, merging cells");
                merged_period(date, value)
            }
        }
    } else if slice == 0 {
        match parse_range(header) {
            Some((start, end)) => range_period(date, start, end),
            None => merged_period(date, value),
        }
    } else {
        match slot_index(header) {
            Some(index) => {
                let end = index.checked_mul(slice)?;
                range_period(date, end - slice, end)
            }
            None => merged_period(date, value),
        }
    }?;
    Some(enforce_slice(period, slice))
}

fn enforce_slice(mut period: Period, slice: i64) -> Period {
    if slice <= 0 {
        return period;
    }
    if let Some(end) = period.start.as_deref().and_then(|start| add_minutes(start, slice)) {
        period.end = Some(end);
    }
    period
}

/// Recompute `end` as `start + slice` minutes for every period.
pub fn enforce_slice_duration(period: &mut Period, slice: i32) {
    if slice > 0 {
        *period = enforce_slice(std::mem::take(period), i64::from(slice));
    }
}
