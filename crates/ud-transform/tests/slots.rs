//! Tests for slot grouping and slot-duration harmonization.

use ud_model::{Period, RawRecord, ResolvedRecord};
use ud_transform::slots::{
    DEFAULT_SLOT_MINUTES, group_slot_days, harmonize_slots, infer_slot_minutes,
};

fn record(id: usize, start: &str, end: &str) -> ResolvedRecord {
    ResolvedRecord {
        id,
        period: Some(Period::new(start, end)),
        ..ResolvedRecord::default()
    }
}

fn periods(records: &[ResolvedRecord]) -> Vec<(usize, &str, &str)> {
    records
        .iter()
        .map(|record| {
            let period = record.period.as_ref().unwrap();
            (
                record.id,
                period.start.as_deref().unwrap(),
                period.end.as_deref().unwrap(),
            )
        })
        .collect()
}

fn row(id: usize, cells: &[&str]) -> RawRecord {
    RawRecord::new(id, cells.iter().map(|cell| cell.to_string()).collect())
}

#[test]
fn inferred_slot_is_smallest_positive_gap() {
    let mut records = vec![
        record(1, "garbage", "garbage"),
        record(2, "2024-10-27T00:30:00", "2024-10-27T01:00:00"),
        record(3, "2024-10-27T00:00:00", "2024-10-27T00:10:00"),
    ];
    harmonize_slots(&mut records, -1);
    assert_eq!(
        periods(&records),
        vec![
            (1, "2024-10-27T00:00:00", "2024-10-27T00:10:00"),
            (2, "2024-10-27T00:30:00", "2024-10-27T00:40:00"),
            (3, "garbage", "garbage"),
        ]
    );
}

#[test]
fn negative_and_zero_gaps_are_ignored() {
    let records = vec![
        record(1, "2024-10-27T01:00:00", "2024-10-27T00:30:00"),
        record(2, "2024-10-27T02:00:00", "2024-10-27T02:00:00"),
        record(3, "2024-10-27T03:00:00", "2024-10-27T03:20:00"),
    ];
    assert_eq!(infer_slot_minutes(&records), 20);
}

#[test]
fn zero_durations_fall_back_to_default_slot() {
    let mut records = vec![
        record(1, "2024-10-27T00:15:00", "2024-10-27T00:15:00"),
        record(2, "2024-10-27T00:00:00", "2024-10-27T00:00:00"),
    ];
    assert_eq!(infer_slot_minutes(&records), DEFAULT_SLOT_MINUTES);
    harmonize_slots(&mut records, 0);
    assert_eq!(
        periods(&records),
        vec![
            (1, "2024-10-27T00:00:00", "2024-10-27T00:15:00"),
            (2, "2024-10-27T00:15:00", "2024-10-27T00:30:00"),
        ]
    );
}

#[test]
fn unparsable_starts_keep_their_relative_order() {
    let mut records = vec![
        record(1, "first-bad", "first-bad"),
        record(2, "2024-10-27T00:30:00+01:00", "2024-10-27T00:45:00+01:00"),
        ResolvedRecord::new(3),
        record(4, "second-bad", "second-bad"),
        record(5, "2024-10-27T00:00:00+01:00", "2024-10-27T00:15:00+01:00"),
    ];
    harmonize_slots(&mut records, -5);
    let starts: Vec<Option<&str>> = records
        .iter()
        .map(|record| record.period.as_ref().and_then(|p| p.start.as_deref()))
        .collect();
    assert_eq!(
        starts,
        vec![
            Some("2024-10-27T00:00:00+01:00"),
            Some("2024-10-27T00:30:00+01:00"),
            Some("first-bad"),
            None,
            Some("second-bad"),
        ]
    );
    let ids: Vec<usize> = records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    let end = records[1].period.as_ref().unwrap().end.as_deref();
    assert_eq!(end, Some("2024-10-27T00:45:00+01:00"));
}

#[test]
fn empty_input_uses_default_slot() {
    assert_eq!(infer_slot_minutes(&[]), DEFAULT_SLOT_MINUTES);
}

#[test]
fn days_group_interleaved_rows_in_first_seen_order() {
    let rows = vec![
        row(1, &["27/10/2024", "1"]),
        row(2, &["28/10/2024", "2"]),
        row(3, &[" ", "x"]),
        row(4, &["27/10/2024", "3"]),
        row(5, &["28/10/2024", "4"]),
        row(6, &["27/10/2024", "5"]),
        row(7, &["29/10/2024", "6"]),
    ];
    let days = group_slot_days(&rows, 0);
    let summary: Vec<(&str, usize, Option<usize>)> = days
        .iter()
        .map(|day| (day.date, day.first.id, day.second.map(|row| row.id)))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("27/10/2024", 1, Some(4)),
            ("28/10/2024", 2, Some(5)),
            ("29/10/2024", 7, None),
        ]
    );
}
