//! DST-aware normalization of period timestamps into a fixed target offset.
//!
//! Two modes:
//!
//! - **Explicit offset** (ambiguity handling off): every timestamp must carry
//!   its own offset or be a UTC instant.
//! - **Zone handling** (ambiguity handling on): timestamps are zone-naive
//!   local times in a source IANA zone. Local times inside a DST overlap are
//!   disambiguated by arrival order, which needs every record seen first:
//!   [`collect_timestamps`] builds an arena of timestamp references, then
//!   [`resolve_timestamps`] decides each one. Both are pure.
//!
//! A record survives only if every timestamp key it carries resolves. Each
//! dropped record is logged and returned in the drop log.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use ud_model::{PeriodKey, ResolvedRecord};

use crate::datetime::{format_local, parse_local};

/// Why a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UnparsableExplicit,
    MissingZone,
    UnparsableLocal,
    Gap,
    SingleOverlap,
    ExtraOverlap,
}

impl DropReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::UnparsableExplicit => "unable to parse timestamp with explicit UTC/offset",
            Self::MissingZone => "missing source time zone",
            Self::UnparsableLocal => "unparsable local timestamp",
            Self::Gap => "gap in timezone rules",
            Self::SingleOverlap => "single occurrence in DST overlap without UTC",
            Self::ExtraOverlap => "extra occurrence for same local time in DST overlap",
        }
    }
}

impl Serialize for DropReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One dropped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropEntry {
    pub id: usize,
    pub key: PeriodKey,
    pub raw: String,
    pub reason: DropReason,
}

/// Parameters of one normalization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationContext {
    pub source_zone: Option<Tz>,
    pub target: FixedOffset,
    pub handle_ambiguity: bool,
    /// Keys to normalize, in order.
    pub keys: Vec<PeriodKey>,
    /// Resolve a lone overlap occurrence to the earlier offset instead of dropping it.
    pub allow_single_overlap: bool,
}

impl NormalizationContext {
    pub fn new(target: FixedOffset) -> Self {
        Self {
            source_zone: None,
            target,
            handle_ambiguity: false,
            keys: vec![PeriodKey::Start, PeriodKey::End],
            allow_single_overlap: false,
        }
    }

    #[must_use]
    pub fn with_zone(mut self, zone: Option<Tz>) -> Self {
        self.source_zone = zone;
        self
    }

    #[must_use]
    pub fn with_ambiguity_handling(mut self, enable: bool) -> Self {
        self.handle_ambiguity = enable;
        self
    }

    #[must_use]
    pub fn with_keys(mut self, keys: Vec<PeriodKey>) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub fn with_single_overlap(mut self, allow: bool) -> Self {
        self.allow_single_overlap = allow;
        self
    }

    /// Keys to normalize for a slice: `start` only when `slice > 0`, since
    /// `end` is recomputed from it afterwards.
    pub fn keys_for_slice(slice: i32) -> Vec<PeriodKey> {
        if slice > 0 {
            vec![PeriodKey::Start]
        } else {
            vec![PeriodKey::Start, PeriodKey::End]
        }
    }
}

/// Records kept after normalization, plus the drop log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationOutcome {
    pub records: Vec<ResolvedRecord>,
    pub dropped: Vec<DropEntry>,
}

/// State of a timestamp after the first pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefState {
    Resolved(DateTime<FixedOffset>),
    /// Local time valid under two offsets; instants sorted ascending.
    Overlap {
        local: NaiveDateTime,
        earlier: DateTime<FixedOffset>,
        later: DateTime<FixedOffset>,
    },
    Failed(DropReason),
}

/// One timestamp of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRef {
    /// Index of the owning record in the input slice.
    pub record: usize,
    pub key: PeriodKey,
    pub raw: String,
    pub state: RefState,
}

/// Output of the first pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampArena {
    pub refs: Vec<TimestampRef>,
    /// `(key, local time)` to arena indices, in arrival order.
    pub overlaps: BTreeMap<(PeriodKey, NaiveDateTime), Vec<usize>>,
}

/// Parse a timestamp carrying an explicit offset, a zone suffix, or a UTC marker.
///
/// Tried in order: offset-qualified (`2024-10-27T00:30:00+02:00`), zoned
/// (`...+01:00[Europe/Rome]` or `...T02:30:00[Europe/Rome]`), bare instant
/// (`2024-10-27T00:30:00Z`). A zoned value without an offset is rejected
/// when its local time is repeated or skipped in that zone.
pub fn parse_explicit(raw: &str) -> Option<DateTime<FixedOffset>> {
    let value = raw.trim();
    parse_offset_qualified(value)
        .or_else(|| parse_zoned(value))
        .or_else(|| {
            value
                .parse::<DateTime<Utc>>()
                .ok()
                .map(|instant| instant.fixed_offset())
        })
}

fn parse_offset_qualified(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z"))
        .ok()
}

fn parse_zoned(value: &str) -> Option<DateTime<FixedOffset>> {
    let (stamp, zone) = value.strip_suffix(']')?.split_once('[')?;
    let zone: Tz = zone.parse().ok()?;
    if let Some(instant) = parse_offset_qualified(stamp) {
        return Some(instant.with_timezone(&zone).fixed_offset());
    }
    let local = parse_local(stamp)?;
    match zone.from_local_datetime(&local) {
        LocalResult::Single(instant) => Some(instant.fixed_offset()),
        LocalResult::Ambiguous(..) | LocalResult::None => None,
    }
}

/// Normalize every record's period timestamps into `context.target`.
pub fn normalize_periods(
    records: Vec<ResolvedRecord>,
    context: &NormalizationContext,
) -> NormalizationOutcome {
    if records.is_empty() {
        return NormalizationOutcome::default();
    }
    let outcome = if !context.handle_ambiguity {
        normalize_explicit(records, context)
    } else if let Some(zone) = context.source_zone {
        let arena = collect_timestamps(&records, &context.keys, zone);
        let resolutions = resolve_timestamps(&arena, context.allow_single_overlap);
        apply_resolutions(records, &arena, &resolutions, context.target)
    } else {
        warn!(
            records = records.len(),
            "ambiguity handling requested without a source time zone, dropping all records"
        );
        drop_all(records, context)
    };
    info!(
        kept = outcome.records.len(),
        dropped = outcome.dropped.len(),
        "normalization completed"
    );
    outcome
}

fn log_drop(entry: &DropEntry) {
    warn!(
        id = entry.id,
        key = %entry.key,
        timestamp = %entry.raw,
        reason = %entry.reason,
        "dropping record"
    );
}

fn drop_all(records: Vec<ResolvedRecord>, context: &NormalizationContext) -> NormalizationOutcome {
    let key = context.keys.first().copied().unwrap_or(PeriodKey::Start);
    let dropped = records
        .into_iter()
        .map(|record| {
            let raw = record
                .period
                .as_ref()
                .and_then(|period| period.get(key))
                .unwrap_or_default()
                .to_string();
            let entry = DropEntry {
                id: record.id,
                key,
                raw,
                reason: DropReason::MissingZone,
            };
            log_drop(&entry);
            entry
        })
        .collect();
    NormalizationOutcome {
        records: Vec::new(),
        dropped,
    }
}

fn to_target(instant: DateTime<FixedOffset>, target: FixedOffset) -> String {
    format_local(instant.with_timezone(&target).naive_local())
}

fn normalize_explicit(
    records: Vec<ResolvedRecord>,
    context: &NormalizationContext,
) -> NormalizationOutcome {
    let mut outcome = NormalizationOutcome::default();
    'records: for mut record in records {
        let mut rewritten = Vec::with_capacity(context.keys.len());
        if let Some(period) = &record.period {
            for &key in &context.keys {
                let Some(raw) = period.get(key) else {
                    continue;
                };
                match parse_explicit(raw) {
                    Some(instant) => rewritten.push((key, to_target(instant, context.target))),
                    None => {
                        let entry = DropEntry {
                            id: record.id,
                            key,
                            raw: raw.to_string(),
                            reason: DropReason::UnparsableExplicit,
                        };
                        log_drop(&entry);
                        outcome.dropped.push(entry);
                        continue 'records;
                    }
                }
            }
        }
        if let Some(period) = record.period.as_mut() {
            for (key, value) in rewritten {
                period.set(key, value);
            }
        }
        outcome.records.push(record);
    }
    outcome
}

/// First pass: parse every local timestamp and classify it against `zone`.
///
/// Single-offset times resolve immediately; gaps and unparsable values fail;
/// overlap times are grouped by `(key, local time)` in arrival order.
pub fn collect_timestamps(
    records: &[ResolvedRecord],
    keys: &[PeriodKey],
    zone: Tz,
) -> TimestampArena {
    let mut arena = TimestampArena::default();
    for (record_index, record) in records.iter().enumerate() {
        let Some(period) = &record.period else {
            continue;
        };
        for &key in keys {
            let Some(raw) = period.get(key) else {
                continue;
            };
            let state = match parse_local(raw) {
                None => RefState::Failed(DropReason::UnparsableLocal),
                Some(local) => match zone.from_local_datetime(&local) {
                    LocalResult::None => RefState::Failed(DropReason::Gap),
                    LocalResult::Single(instant) => RefState::Resolved(instant.fixed_offset()),
                    LocalResult::Ambiguous(first, second) => {
                        let (earlier, later) = if first <= second {
                            (first, second)
                        } else {
                            (second, first)
                        };
                        arena
                            .overlaps
                            .entry((key, local))
                            .or_default()
                            .push(arena.refs.len());
                        RefState::Overlap {
                            local,
                            earlier: earlier.fixed_offset(),
                            later: later.fixed_offset(),
                        }
                    }
                },
            };
            arena.refs.push(TimestampRef {
                record: record_index,
                key,
                raw: raw.to_string(),
                state,
            });
        }
    }
    arena
}

/// Second pass: decide every reference of the arena.
///
/// Within an overlap group the first occurrence takes the earlier instant and
/// the second the later one; a lone occurrence and any third or later
/// occurrence fail. The result is indexed like `arena.refs`.
pub fn resolve_timestamps(
    arena: &TimestampArena,
    allow_single_overlap: bool,
) -> Vec<Result<DateTime<FixedOffset>, DropReason>> {
    let mut resolutions: Vec<Result<DateTime<FixedOffset>, DropReason>> = arena
        .refs
        .iter()
        .map(|reference| match &reference.state {
            RefState::Resolved(instant) => Ok(*instant),
            RefState::Failed(reason) => Err(*reason),
            RefState::Overlap { .. } => Err(DropReason::SingleOverlap),
        })
        .collect();

    for occurrences in arena.overlaps.values() {
        for (position, &ref_index) in occurrences.iter().enumerate() {
            let RefState::Overlap { earlier, later, .. } = &arena.refs[ref_index].state else {
                continue;
            };
            resolutions[ref_index] = match (occurrences.len(), position) {
                (1, _) if allow_single_overlap => Ok(*earlier),
                (1, _) => Err(DropReason::SingleOverlap),
                (_, 0) => Ok(*earlier),
                (_, 1) => Ok(*later),
                _ => Err(DropReason::ExtraOverlap),
            };
        }
    }
    resolutions
}

/// Rewrite surviving records and build the drop log.
fn apply_resolutions(
    records: Vec<ResolvedRecord>,
    arena: &TimestampArena,
    resolutions: &[Result<DateTime<FixedOffset>, DropReason>],
    target: FixedOffset,
) -> NormalizationOutcome {
    let mut per_record: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    for (ref_index, reference) in arena.refs.iter().enumerate() {
        per_record[reference.record].push(ref_index);
    }

    let mut outcome = NormalizationOutcome::default();
    for (mut record, ref_indices) in records.into_iter().zip(per_record) {
        let failure = ref_indices
            .iter()
            .find_map(|&index| resolutions[index].err().map(|reason| (index, reason)));
        if let Some((index, reason)) = failure {
            let reference = &arena.refs[index];
            let entry = DropEntry {
                id: record.id,
                key: reference.key,
                raw: reference.raw.clone(),
                reason,
            };
            log_drop(&entry);
            outcome.dropped.push(entry);
            continue;
        }
        if let Some(period) = record.period.as_mut() {
            for index in ref_indices {
                if let Ok(instant) = resolutions[index] {
                    period.set(arena.refs[index].key, to_target(instant, target));
                }
            }
        }
        outcome.records.push(record);
    }
    outcome
}
