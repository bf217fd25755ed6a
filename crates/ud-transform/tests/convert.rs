//! End-to-end conversion of parsed tables and feeds.

use chrono::FixedOffset;
use chrono_tz::Europe::Rome;
use serde_json::json;
use ud_ingest::{SourceTable, parse_json_feed, read_source_table_from_reader};
use ud_model::{Coordinates, PropertyConfig, ResolvedRecord};
use ud_transform::{
    ConversionOptions, ConvertError, DropReason, NormalizationContext, convert_feed, convert_table,
};

fn config(value: serde_json::Value) -> PropertyConfig {
    serde_json::from_value(value).unwrap()
}

fn table(content: &str) -> SourceTable {
    read_source_table_from_reader(content.as_bytes(), b';').unwrap()
}

fn offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap()
}

fn rome(config: &PropertyConfig, target_hours: i32, slot_mode: bool) -> ConversionOptions {
    ConversionOptions::new(
        config.configurations.period_config(slot_mode),
        NormalizationContext::new(offset(target_hours))
            .with_zone(Some(Rome))
            .with_ambiguity_handling(true),
    )
}

fn summary(records: &[ResolvedRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let period = record.period.clone().unwrap_or_default();
            let properties: Vec<String> = record
                .property
                .iter()
                .map(|prop| format!("{}={}", prop.name, prop.val))
                .collect();
            format!(
                "{} {}..{} {}",
                record.id,
                period.start.unwrap_or_default(),
                period.end.unwrap_or_default(),
                properties.join(",")
            )
        })
        .collect()
}

fn range_config() -> PropertyConfig {
    config(json!({
        "name": "quarter-hour energy",
        "specification": {
            "properties": {
                "propertyDefinition": [
                    { "propertyName": "ActiveEnergy" },
                    { "propertyName": "PodId" }
                ]
            }
        },
        "mappings": {
            "00:00-00:15": { "name": "ActiveEnergy", "function": "num" },
            "00:15-00:30": { "name": "ActiveEnergy", "function": "num" },
            "POD": { "name": "PodId" }
        },
        "configurations": {
            "date": "Data",
            "period": ["00:00-00:15", "00:15-00:30"],
            "slice": -1
        }
    }))
}

#[test]
fn range_columns_expand_into_one_record_per_cell() {
    let config = range_config();
    let source = table(
        "Data;00:00-00:15;00:15-00:30;POD\n\
         01/07/2022;1,5;2;IT001\n\
         ;9;9;IT001\n\
         02/07/2022;3;;IT001\n",
    );

    let outcome = convert_table(&config, &source, &rome(&config, 2, false)).unwrap();

    assert_eq!(outcome.rows_read, 3);
    assert_eq!(outcome.candidates, 4);
    assert!(outcome.dropped.is_empty());
    assert_eq!(outcome.unmatched_headers, vec!["Data".to_string()]);
    assert_eq!(
        summary(&outcome.records),
        vec![
            "1 2022-07-01T00:00:00..2022-07-01T00:15:00 ActiveEnergy=1.5,PodId=IT001",
            "2 2022-07-01T00:15:00..2022-07-01T00:30:00 ActiveEnergy=2,PodId=IT001",
            "3 2022-07-02T00:00:00..2022-07-02T00:15:00 ActiveEnergy=3,PodId=IT001",
            "4 2022-07-02T00:15:00..2022-07-02T00:30:00 ActiveEnergy=0,PodId=IT001",
        ]
    );
}

#[test]
fn local_timestamps_are_dropped_in_explicit_mode() {
    let config = range_config();
    let source = table("Data;00:00-00:15;00:15-00:30;POD\n01/07/2022;1;2;IT001\n");
    let options = ConversionOptions::new(
        config.configurations.period_config(false),
        NormalizationContext::new(offset(1)),
    );

    let outcome = convert_table(&config, &source, &options).unwrap();

    assert!(outcome.all_dropped());
    assert_eq!(outcome.dropped.len(), 2);
    assert!(outcome
        .dropped
        .iter()
        .all(|entry| entry.reason == DropReason::UnparsableExplicit));
}

#[test]
fn slot_profile_splits_the_repeated_hour() {
    let config = config(json!({
        "specification": {
            "properties": { "propertyDefinition": [{ "propertyName": "Energy" }] }
        },
        "mappings": {
            "ea1": { "name": "Energy", "function": "num" },
            "ea2": { "name": "Energy", "function": "num" },
            "ea9": { "name": "Energy", "function": "num" }
        },
        "configurations": {
            "date": "Data",
            "period": ["ea1", "ea2", "ea9"],
            "slice": 15,
            "nullsField": { "Status": "ok" }
        }
    }));
    let source = table(
        "Data;ea1;ea2;ea9\n\
         2024-10-27;3;0;5\n\
         2024-10-27;0;0;7\n\
         2024-10-27;1;1;1\n",
    );

    let outcome = convert_table(&config, &source, &rome(&config, 1, true)).unwrap();

    assert!(outcome.dropped.is_empty());
    insta::assert_json_snapshot!(summary(&outcome.records), @r#"
    [
      "1 2024-10-26T23:00:00..2024-10-26T23:15:00 Energy=3,Status=ok",
      "2 2024-10-26T23:15:00..2024-10-26T23:30:00 Energy=0,Status=ok",
      "3 2024-10-27T01:00:00..2024-10-27T01:15:00 Energy=5,Status=ok",
      "4 2024-10-27T02:00:00..2024-10-27T02:15:00 Energy=7,Status=ok"
    ]
    "#);
}

#[test]
fn sign_split_rows_without_period_carry_coordinates() {
    let config = config(json!({
        "specification": {
            "properties": {
                "propertyDefinition": [
                    { "propertyName": "ExportedPower" },
                    { "propertyName": "ImportedPower" },
                    {
                        "propertyName": "coordinates",
                        "subProperties": { "propertyName": ["format", "latitude", "longitude", "height"] }
                    },
                    { "propertyName": "latitude" },
                    { "propertyName": "longitude" }
                ]
            }
        },
        "mappings": {
            "P": { "name": "ExportedPower", "nameForNegative": "ImportedPower" },
            "LAT": { "name": "latitude", "coordinates": true },
            "LON": { "name": "longitude", "coordinates": true }
        }
    }));
    let source = table("P;LAT;LON\n12,5;41,1;16,8\n-3;bad;16.9\n");
    let options = ConversionOptions::new(
        config.configurations.period_config(false),
        NormalizationContext::new(offset(0)),
    );

    let outcome = convert_table(&config, &source, &options).unwrap();

    assert_eq!(
        summary(&outcome.records),
        vec![
            "1 .. ExportedPower=12.5,ImportedPower=null",
            "2 .. ExportedPower=null,ImportedPower=-3",
        ]
    );
    assert_eq!(
        outcome.records[0].coordinates,
        Some(Coordinates {
            format: "WGS84-DD".to_string(),
            latitude: 41.1,
            longitude: 16.8,
            height: 0.0,
        })
    );
    let second = outcome.records[1].coordinates.as_ref().unwrap();
    assert_eq!(second.latitude, 0.0);
    assert_eq!(second.longitude, 16.9);
}

#[test]
fn file_level_defects_are_errors() {
    let config = range_config();
    let blank = SourceTable {
        headers: vec![String::new(), String::new()],
        rows: vec![vec!["1".to_string(), "2".to_string()]],
    };
    assert!(matches!(
        convert_table(&config, &blank, &rome(&config, 1, false)),
        Err(ConvertError::EmptyHeader)
    ));

    let unmapped = table("a;b;c\n1;2;3\n");
    assert!(matches!(
        convert_table(&config, &unmapped, &rome(&config, 1, false)),
        Err(ConvertError::NoMappedColumns { columns: 3 })
    ));

    let no_slots = table("Data;POD\n01/07/2022;IT001\n");
    assert!(matches!(
        convert_table(&config, &no_slots, &rome(&config, 1, true)),
        Err(ConvertError::MissingSlotColumns { .. })
    ));
}

#[test]
fn feed_objects_become_records() {
    let config = config(json!({
        "mappings": {
            "temp": { "name": "Temperature", "function": "/10" },
            "hum": { "name": "Humidity", "function": ">", "alternativeValue": "n/a" }
        },
        "configurations": { "nullsField": { "Quality": null } }
    }));
    let objects = parse_json_feed(
        r#"{"result": [
            {"timestamp": "2024-05-01T10:00:00Z", "temp": "215", "hum": -4},
            {"temp": 180.5}
        ]}"#,
    )
    .unwrap();

    let records = convert_feed(&config, &objects);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].timestamp.as_deref(), Some("2024-05-01T10:00:00Z"));
    assert_eq!(
        summary(&records),
        vec![
            "1 .. Humidity=n/a,Temperature=21.5,Quality=null",
            "2 .. Temperature=18.05,Quality=null",
        ]
    );
}
