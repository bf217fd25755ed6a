//! Date/time helpers for source timestamps.
//!
//! Source feeds write dates in a handful of layouts (ISO, European
//! `dd/MM/yyyy`, compact `yyyyMMdd[HHmmss]`). Detection walks a fixed ordered
//! list and takes the first layout that parses; unknown layouts are assumed to
//! be `dd/MM/yyyy`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Date-time layouts, in detection order.
const DATE_TIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y%m%d%H%M%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.3f",
    "%Y-%m-%dT%H:%M:%S%.3fZ",
];

/// Date-only layouts, in detection order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y%m%d"];

/// Layout assumed when nothing else parses.
const FALLBACK_DATE_FORMAT: &str = "%d/%m/%Y";

/// Zone-naive layouts accepted by the time normalizer.
const LOCAL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%Y%m%d%H%M%S",
    "%Y-%m-%d %H:%M",
];

/// Layout detected for a date string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    DateTime(&'static str),
    Date(&'static str),
    /// Nothing parsed; the `dd/MM/yyyy` fallback applies.
    Fallback,
}

impl DetectedFormat {
    pub fn has_time(self) -> bool {
        matches!(self, Self::DateTime(_))
    }
}

/// Detect the layout of `value`.
pub fn detect_format(value: &str) -> DetectedFormat {
    let value = value.trim();
    if let Some(format) = DATE_TIME_FORMATS
        .iter()
        .copied()
        .find(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
    {
        return DetectedFormat::DateTime(format);
    }
    if let Some(format) = DATE_FORMATS
        .iter()
        .copied()
        .find(|format| NaiveDate::parse_from_str(value, format).is_ok())
    {
        return DetectedFormat::Date(format);
    }
    DetectedFormat::Fallback
}

/// Render a local date-time as `yyyy-MM-ddTHH:mm:ss[.fraction]`.
///
/// The fraction is printed only when non-zero, without trailing zeros.
pub fn format_local(value: NaiveDateTime) -> String {
    let mut out = value.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = value.nanosecond() % 1_000_000_000;
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out
}

/// Parse a zone-naive timestamp.
pub fn parse_local(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Compose `date` plus `minutes` after midnight into a local timestamp.
///
/// When `date` already carries a time, that timestamp is returned as-is
/// (normalized to ISO layout). Offsets of 1440 minutes or more roll onto the
/// following days.
pub fn minutes_to_timestamp(date: &str, minutes: i64) -> Option<String> {
    let date = date.trim();
    let day = match detect_format(date) {
        DetectedFormat::DateTime(format) => {
            return NaiveDateTime::parse_from_str(date, format)
                .ok()
                .map(|value| value.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
        DetectedFormat::Date(format) => NaiveDate::parse_from_str(date, format).ok()?,
        DetectedFormat::Fallback => NaiveDate::parse_from_str(date, FALLBACK_DATE_FORMAT).ok()?,
    };
    let midnight = day.and_time(NaiveTime::MIN);
    let value = midnight.checked_add_signed(Duration::try_minutes(minutes)?)?;
    Some(value.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn contains_date_component(value: &str) -> bool {
    let bytes = value.as_bytes();
    let matches_at = |start: usize, shape: &[u8]| {
        bytes.len() >= start + shape.len()
            && shape.iter().enumerate().all(|(offset, &expected)| {
                let actual = bytes[start + offset];
                match expected {
                    b'd' => actual.is_ascii_digit(),
                    other => actual == other,
                }
            })
    };
    (0..bytes.len()).any(|start| {
        matches_at(start, b"dddd-dd-dd")
            || matches_at(start, b"dd/dd/dddd")
            || matches_at(start, b"dddddddd")
    })
}

fn contains_time_component(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.iter().enumerate().any(|(index, &byte)| {
        byte == b':'
            && index >= 1
            && bytes[index - 1].is_ascii_digit()
            && bytes.len() > index + 2
            && bytes[index + 1].is_ascii_digit()
            && bytes[index + 2].is_ascii_digit()
    })
}

/// True when `value` carries both a calendar date and a clock time.
pub fn is_full_timestamp(value: &str) -> bool {
    contains_date_component(value) && contains_time_component(value)
}

/// Merge a date cell and a time cell into one timestamp.
///
/// Whichever side already carries a full date and time wins. Otherwise the
/// two are joined: without a delimiter when the date still contains `T`, with
/// a space when it contains one, else with `T`.
pub fn merge_date_and_time(date: Option<&str>, time: Option<&str>) -> Option<String> {
    let date = date.map(str::trim).filter(|value| !value.is_empty());
    let time = time.map(str::trim).filter(|value| !value.is_empty());
    if let Some(date) = date.filter(|value| is_full_timestamp(value)) {
        return Some(date.to_string());
    }
    if let Some(time) = time.filter(|value| is_full_timestamp(value)) {
        return Some(time.to_string());
    }
    let (date, time) = match (date, time) {
        (None, None) => return None,
        (Some(date), None) => return Some(date.to_string()),
        (None, Some(time)) => return Some(time.to_string()),
        (Some(date), Some(time)) => (date, time),
    };
    let date = date.strip_suffix(['T', 't']).unwrap_or(date);
    let time = time.strip_prefix(['T', 't']).unwrap_or(time);
    let delimiter = if date.contains('T') {
        ""
    } else if date.contains(' ') {
        " "
    } else {
        "T"
    };
    Some(format!("{date}{delimiter}{time}"))
}

fn fraction_digits(value: &str) -> usize {
    let Some(time_start) = value.find(['T', ' ']) else {
        return 0;
    };
    let time = &value[time_start..];
    let Some(dot) = time.find('.') else {
        return 0;
    };
    time[dot + 1..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count()
}

fn format_with_fraction(value: NaiveDateTime, digits: usize) -> String {
    let mut out = value.format("%Y-%m-%dT%H:%M:%S").to_string();
    if digits > 0 {
        let nanos = format!("{:09}", value.nanosecond() % 1_000_000_000);
        out.push('.');
        out.push_str(&nanos[..digits.min(9)]);
    }
    out
}

fn format_offset_suffix(raw: &str, value: DateTime<FixedOffset>) -> String {
    if raw.ends_with(['Z', 'z']) {
        "Z".to_string()
    } else {
        value.format("%:z").to_string()
    }
}

/// Add `minutes` to a timestamp, keeping its fraction digits and offset suffix.
pub fn add_minutes(value: &str, minutes: i64) -> Option<String> {
    let value = value.trim();
    let delta = Duration::try_minutes(minutes)?;
    let digits = fraction_digits(value);
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        let shifted = parsed.checked_add_signed(delta)?;
        return Some(format!(
            "{}{}",
            format_with_fraction(shifted.naive_local(), digits),
            format_offset_suffix(value, shifted)
        ));
    }
    let parsed = parse_local(value).or_else(|| {
        DATE_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    })?;
    let shifted = parsed.checked_add_signed(delta)?;
    Some(format_with_fraction(shifted, digits))
}

/// Whole minutes from `start` to `end`, both local timestamps.
pub fn minutes_between(start: &str, end: &str) -> Option<i64> {
    let start = parse_any(start)?;
    let end = parse_any(end)?;
    Some((end - start).num_minutes())
}

/// Parse a local or offset-qualified timestamp, ignoring any offset.
pub fn parse_any(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    parse_local(value).or_else(|| {
        DATE_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_in_order() {
        assert_eq!(
            detect_format("2023-10-29 01:00:00"),
            DetectedFormat::DateTime("%Y-%m-%d %H:%M:%S")
        );
        assert_eq!(detect_format("01/07/2022"), DetectedFormat::Date("%d/%m/%Y"));
        assert_eq!(detect_format("20220701"), DetectedFormat::Date("%Y%m%d"));
        assert_eq!(detect_format("July 1st"), DetectedFormat::Fallback);
    }

    #[test]
    fn full_timestamp_needs_date_and_time() {
        assert!(is_full_timestamp("2023-10-30T08:00:00"));
        assert!(is_full_timestamp("30/10/2023 8:00"));
        assert!(!is_full_timestamp("2023-10-29"));
        assert!(!is_full_timestamp("01:00:00.000Z"));
    }

    #[test]
    fn fraction_is_trimmed() {
        let value = NaiveDate::from_ymd_opt(2023, 10, 23)
            .unwrap()
            .and_hms_milli_opt(10, 19, 23, 530)
            .unwrap();
        assert_eq!(format_local(value), "2023-10-23T10:19:23.53");
    }
}
