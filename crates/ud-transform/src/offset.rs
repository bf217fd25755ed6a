//! Target offsets and source zones.

use chrono::{FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use tracing::{error, warn};

const MAX_OFFSET_SECONDS: i32 = 18 * 3600;

fn utc() -> FixedOffset {
    Utc.fix()
}

fn strip_utc_prefix(value: &str) -> Option<&str> {
    value
        .get(..3)
        .filter(|prefix| prefix.eq_ignore_ascii_case("UTC"))
        .map(|_| &value[3..])
}

/// Parse a fixed UTC offset such as `+2`, `-05:30`, `UTC+0100` or `Z`.
///
/// Blank, `UTC` and `Z` mean UTC. A missing sign means `+`.
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("UTC") || trimmed.eq_ignore_ascii_case("Z") {
        return Some(utc());
    }
    let without_prefix = strip_utc_prefix(trimmed).map_or(trimmed, str::trim);
    let (sign, body) = match without_prefix.as_bytes().first()? {
        b'+' => (1, &without_prefix[1..]),
        b'-' => (-1, &without_prefix[1..]),
        _ => (1, without_prefix),
    };
    let (hours, minutes) = split_offset_body(body)?;
    if minutes >= 60 {
        return None;
    }
    let seconds = sign * (hours * 3600 + minutes * 60);
    if seconds.abs() > MAX_OFFSET_SECONDS {
        return None;
    }
    FixedOffset::east_opt(seconds)
}

fn split_offset_body(body: &str) -> Option<(i32, i32)> {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if let Some((hours, minutes)) = body.split_once(':') {
        if hours.len() > 2 || minutes.len() != 2 || !all_digits(hours) || !all_digits(minutes) {
            return None;
        }
        return Some((hours.parse().ok()?, minutes.parse().ok()?));
    }
    if !all_digits(body) {
        return None;
    }
    match body.len() {
        1 | 2 => Some((body.parse().ok()?, 0)),
        4 => Some((body[..2].parse().ok()?, body[2..].parse().ok()?)),
        _ => None,
    }
}

/// Parse the configured target offset, falling back to UTC.
pub fn target_offset(raw: &str) -> FixedOffset {
    parse_offset(raw).unwrap_or_else(|| {
        warn!(offset = %raw, "invalid target UTC offset, using UTC");
        utc()
    })
}

/// Context label for a configured offset: `+2` becomes `UTC+2`.
pub fn offset_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("Z") {
        return "UTC+0".to_string();
    }
    if strip_utc_prefix(trimmed).is_some() {
        return trimmed.to_string();
    }
    if trimmed.starts_with(['+', '-']) {
        format!("UTC{trimmed}")
    } else {
        format!("UTC+{trimmed}")
    }
}

/// Resolve an IANA zone name. Blank or unknown names yield `None`.
pub fn parse_zone(raw: Option<&str>) -> Option<Tz> {
    let name = raw.map(str::trim).filter(|name| !name.is_empty())?;
    match name.parse::<Tz>() {
        Ok(zone) => Some(zone),
        Err(_) => {
            error!(zone = %name, "unknown source time zone");
            None
        }
    }
}
