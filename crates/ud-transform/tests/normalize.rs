//! Tests for DST-aware time normalization.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use chrono_tz::Europe::Rome;
use proptest::prelude::*;
use ud_model::{Period, PeriodKey, ResolvedRecord};
use ud_transform::normalize::RefState;
use ud_transform::{
    DropReason, NormalizationContext, collect_timestamps, normalize_periods, parse_explicit,
    resolve_timestamps,
};

fn offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap()
}

fn records(stamps: &[&str]) -> Vec<ResolvedRecord> {
    stamps
        .iter()
        .enumerate()
        .map(|(index, stamp)| ResolvedRecord {
            id: index + 1,
            period: Some(Period::instant(*stamp)),
            ..ResolvedRecord::default()
        })
        .collect()
}

fn rome(target_hours: i32) -> NormalizationContext {
    NormalizationContext::new(offset(target_hours))
        .with_zone(Some(Rome))
        .with_ambiguity_handling(true)
}

fn starts(records: &[ResolvedRecord]) -> Vec<&str> {
    records
        .iter()
        .map(|record| record.period.as_ref().unwrap().start.as_deref().unwrap())
        .collect()
}

#[test]
fn repeated_overlap_time_resolves_to_distinct_instants() {
    let outcome = normalize_periods(
        records(&["2024-10-27T02:15:00", "2024-10-27T02:15:00"]),
        &rome(1),
    );
    assert!(outcome.dropped.is_empty());
    assert_eq!(
        starts(&outcome.records),
        vec!["2024-10-27T01:15:00", "2024-10-27T02:15:00"]
    );
    let period = outcome.records[1].period.as_ref().unwrap();
    assert_eq!(period.end.as_deref(), Some("2024-10-27T02:15:00"));
}

#[test]
fn single_overlap_occurrence_is_dropped() {
    let outcome = normalize_periods(
        records(&["2024-10-27T01:45:00", "2024-10-27T02:15:00"]),
        &rome(1),
    );
    assert_eq!(starts(&outcome.records), vec!["2024-10-27T00:45:00"]);
    assert_eq!(outcome.dropped.len(), 1);
    let entry = &outcome.dropped[0];
    assert_eq!(entry.id, 2);
    assert_eq!(entry.key, PeriodKey::Start);
    assert_eq!(entry.raw, "2024-10-27T02:15:00");
    assert_eq!(entry.reason, DropReason::SingleOverlap);
}

#[test]
fn third_overlap_occurrence_is_dropped() {
    let outcome = normalize_periods(
        records(&[
            "2024-10-27T02:15:00",
            "2024-10-27T02:15:00",
            "2024-10-27T02:15:00",
        ]),
        &rome(1),
    );
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].id, 3);
    assert_eq!(outcome.dropped[0].reason, DropReason::ExtraOverlap);
}

#[test]
fn single_overlap_can_be_allowed() {
    let context = rome(1).with_single_overlap(true);
    let outcome = normalize_periods(records(&["2024-10-27T02:15:00"]), &context);
    assert_eq!(starts(&outcome.records), vec!["2024-10-27T01:15:00"]);
}

#[test]
fn gap_times_are_dropped() {
    let outcome = normalize_periods(
        records(&["2024-03-31T02:30:00", "2024-03-31T03:30:00"]),
        &rome(1),
    );
    assert_eq!(starts(&outcome.records), vec!["2024-03-31T02:30:00"]);
    assert_eq!(outcome.records[0].id, 2);
    assert_eq!(outcome.dropped[0].reason, DropReason::Gap);
    assert_eq!(outcome.dropped[0].reason.to_string(), "gap in timezone rules");
}

#[test]
fn unparsable_local_times_are_dropped() {
    let outcome = normalize_periods(records(&["yesterday", "01/07/2022 10:00:00"]), &rome(2));
    assert_eq!(starts(&outcome.records), vec!["2022-07-01T10:00:00"]);
    assert_eq!(outcome.dropped[0].reason, DropReason::UnparsableLocal);
}

#[test]
fn missing_zone_drops_everything() {
    let context = NormalizationContext::new(offset(1)).with_ambiguity_handling(true);
    let outcome = normalize_periods(records(&["2024-01-01T00:00:00", "2024-01-01T00:15:00"]), &context);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.dropped.len(), 2);
    assert!(outcome
        .dropped
        .iter()
        .all(|entry| entry.reason == DropReason::MissingZone));
}

#[test]
fn explicit_offsets_convert_to_target() {
    let context = NormalizationContext::new(offset(1));
    let outcome = normalize_periods(
        records(&[
            "2024-10-27T00:30:00Z",
            "2024-10-27T02:15:00+01:00[Europe/Rome]",
            "2024-10-27T02:15:00",
        ]),
        &context,
    );
    assert_eq!(
        starts(&outcome.records),
        vec!["2024-10-27T01:30:00", "2024-10-27T02:15:00"]
    );
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].id, 3);
    assert_eq!(outcome.dropped[0].reason, DropReason::UnparsableExplicit);
}

#[test]
fn explicit_zone_without_offset_is_not_guessed() {
    let outcome = normalize_periods(
        records(&[
            "2024-10-27T02:30:00[Europe/Rome]",
            "2024-10-27T04:30:00[Europe/Rome]",
        ]),
        &NormalizationContext::new(offset(1)),
    );
    assert_eq!(starts(&outcome.records), vec!["2024-10-27T04:30:00"]);
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].id, 1);
    assert_eq!(outcome.dropped[0].raw, "2024-10-27T02:30:00[Europe/Rome]");
    assert_eq!(outcome.dropped[0].reason, DropReason::UnparsableExplicit);
}

#[test]
fn explicit_fraction_is_kept() {
    let outcome = normalize_periods(
        records(&["2023-10-23T08:19:23.532Z"]),
        &NormalizationContext::new(offset(2)),
    );
    assert_eq!(starts(&outcome.records), vec!["2023-10-23T10:19:23.532"]);
}

#[test]
fn record_with_one_bad_key_is_dropped_whole() {
    let record = ResolvedRecord {
        id: 7,
        period: Some(Period::new("2024-01-01T00:00:00Z", "tomorrow")),
        ..ResolvedRecord::default()
    };
    let outcome = normalize_periods(vec![record], &NormalizationContext::new(offset(0)));
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.dropped[0].key, PeriodKey::End);
    assert_eq!(outcome.dropped[0].raw, "tomorrow");
}

#[test]
fn only_configured_keys_are_normalized() {
    let record = ResolvedRecord {
        id: 1,
        period: Some(Period::new("2024-01-01T00:00:00Z", "raw end")),
        ..ResolvedRecord::default()
    };
    let context = NormalizationContext::new(offset(1)).with_keys(vec![PeriodKey::Start]);
    let outcome = normalize_periods(vec![record], &context);
    let period = outcome.records[0].period.as_ref().unwrap();
    assert_eq!(period.start.as_deref(), Some("2024-01-01T01:00:00"));
    assert_eq!(period.end.as_deref(), Some("raw end"));
}

#[test]
fn records_without_period_pass_through() {
    let record = ResolvedRecord::new(1);
    let outcome = normalize_periods(vec![record.clone()], &rome(1));
    assert_eq!(outcome.records, vec![record]);
}

#[test]
fn first_pass_groups_overlaps_by_key_and_local_time() {
    let input = records(&["2024-10-27T02:15:00", "2024-10-27T12:00:00", "2024-10-27T02:15:00"]);
    let arena = collect_timestamps(&input, &[PeriodKey::Start, PeriodKey::End], Rome);

    assert_eq!(arena.refs.len(), 6);
    assert_eq!(arena.overlaps.len(), 2);
    let starts: Vec<_> = arena
        .overlaps
        .iter()
        .filter(|((key, _), _)| *key == PeriodKey::Start)
        .flat_map(|(_, occurrences)| occurrences.iter().copied())
        .collect();
    assert_eq!(starts, vec![0, 4]);
    assert!(matches!(arena.refs[2].state, RefState::Resolved(_)));

    let resolutions = resolve_timestamps(&arena, false);
    let first = resolutions[0].unwrap();
    let second = resolutions[4].unwrap();
    assert!(first < second);
    assert_eq!(first.with_timezone(&Utc).to_rfc3339(), "2024-10-27T00:15:00+00:00");
}

#[test]
fn parses_explicit_forms() {
    assert!(parse_explicit("2024-10-27T00:30:00+02:00").is_some());
    assert!(parse_explicit("2024-10-27T00:30+02:00").is_some());
    assert!(parse_explicit("2024-10-27T04:30:00[Europe/Rome]").is_some());
    assert!(parse_explicit("2024-10-27T02:30:00+01:00[Europe/Rome]").is_some());
    assert!(parse_explicit("2024-10-27T02:30:00[Europe/Rome]").is_none());
    assert!(parse_explicit("2024-03-31T02:30:00[Europe/Rome]").is_none());
    assert!(parse_explicit("2024-10-27 00:30:00Z").is_some());
    assert!(parse_explicit("2024-10-27T00:30:00").is_none());
    assert!(parse_explicit("2024-10-27T00:30:00[Mars/Base]").is_none());
}

proptest! {
    #[test]
    fn explicit_round_trip_preserves_instant(
        seconds in 0i64..4_000_000_000,
        from_hours in -12i32..=14,
        to_hours in -12i32..=14,
    ) {
        let instant: DateTime<Utc> = Utc.timestamp_opt(seconds, 0).unwrap();
        let source = offset(from_hours);
        let target = offset(to_hours);
        let raw = instant.with_timezone(&source).to_rfc3339();

        let there = normalize_periods(records(&[raw.as_str()]), &NormalizationContext::new(target));
        let local = starts(&there.records)[0].to_string();
        let with_offset = format!("{local}{}", target);
        let back = normalize_periods(records(&[with_offset.as_str()]), &NormalizationContext::new(source));

        let expected = instant.with_timezone(&source).naive_local().format("%Y-%m-%dT%H:%M:%S").to_string();
        prop_assert_eq!(starts(&back.records)[0], expected.as_str());
    }
}
