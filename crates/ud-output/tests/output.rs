//! Tests for document partitioning, rendering and reports.

use std::fs;

use chrono::{FixedOffset, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Value, json};
use ud_model::{Coordinates, Period, PeriodKey, PropertyConfig, ResolvedRecord};
use ud_output::{
    DocumentHeader, FileReport, FileStatus, HeaderOptions, REPORT_FILE_NAME, REPORT_SCHEMA,
    build_documents, part_count, partition_records, render_document, write_conversion_report,
    write_documents,
};
use ud_transform::{DropEntry, DropReason};

fn records(count: usize) -> Vec<ResolvedRecord> {
    (0..count)
        .map(|index| {
            let mut record = ResolvedRecord::new(index + 10);
            record.push_property("Energy", index.to_string());
            record
        })
        .collect()
}

fn header() -> DocumentHeader {
    let config: PropertyConfig = serde_json::from_value(json!({
        "specification": {
            "version": "2.0",
            "id": { "value": "template", "schemeID": "SCPS" },
            "name": "ElectricalConsumption",
            "uri": "https://example.org/ontology",
            "properties": {
                "propertyDefinition": [
                    { "propertyName": "Energy", "dataType": "double", "unitOfMeasure": "kWh" }
                ]
            }
        },
        "context": {
            "producer": { "id": "template", "schemeID": "SCPS" },
            "language": "IT"
        },
        "mappings": { "E": { "name": "Energy" } }
    }))
    .unwrap();
    let options = HeaderOptions {
        producer_id: "POD-1".to_string(),
        coordinates: Some(Coordinates {
            latitude: 41.1,
            longitude: 16.8,
            height: 2.5,
            ..Coordinates::default()
        }),
        target: FixedOffset::east_opt(3600).unwrap(),
        offset_label: "UTC+1".to_string(),
        generated_at: Utc.with_ymd_and_hms(2024, 10, 27, 9, 0, 0).unwrap(),
    };
    DocumentHeader::finalize(&config, &options)
}

#[test]
fn finalize_stamps_run_values() {
    let header = header();
    assert_eq!(
        header.specification.id.as_ref().and_then(|id| id.value.as_deref()),
        Some("POD-1")
    );
    assert_eq!(header.context.producer_id(), Some("POD-1"));
    assert_eq!(header.context.time_zone.as_deref(), Some("UTC+1"));
    assert_eq!(header.context.timestamp.as_deref(), Some("20241027100000"));
    assert_eq!(header.context.language.as_deref(), Some("IT"));
}

#[test]
fn renders_document_shape() {
    let mut record = ResolvedRecord::new(1);
    record.period = Some(Period::new("2024-10-27T01:00:00", "2024-10-27T01:15:00"));
    record.push_property("Energy", "5");
    let documents = build_documents(&header(), vec![record], 0);
    let rendered = render_document(&documents[0]).unwrap();
    assert!(rendered.ends_with("}\n"));

    let value: Value = serde_json::from_str(&rendered).unwrap();
    insta::assert_json_snapshot!(value, @r#"
    {
      "UrbanDataset": {
        "context": {
          "coordinates": {
            "format": "WGS84-DD",
            "height": 2.5,
            "latitude": 41.1,
            "longitude": 16.8
          },
          "language": "IT",
          "producer": {
            "id": "POD-1",
            "schemeID": "SCPS"
          },
          "timeZone": "UTC+1",
          "timestamp": "20241027100000"
        },
        "specification": {
          "id": {
            "schemeID": "SCPS",
            "value": "POD-1"
          },
          "name": "ElectricalConsumption",
          "properties": {
            "propertyDefinition": [
              {
                "dataType": "double",
                "propertyName": "Energy",
                "unitOfMeasure": "kWh"
              }
            ]
          },
          "uri": "https://example.org/ontology",
          "version": "2.0"
        },
        "values": {
          "line": [
            {
              "id": 1,
              "period": {
                "end_ts": "2024-10-27T01:15:00",
                "start_ts": "2024-10-27T01:00:00"
              },
              "property": [
                {
                  "name": "Energy",
                  "val": "5"
                }
              ]
            }
          ]
        }
      }
    }
    "#);
}

#[test]
fn partitions_restart_ids() {
    let parts = partition_records(records(5), 2);
    let ids: Vec<Vec<usize>> = parts
        .iter()
        .map(|part| part.iter().map(|record| record.id).collect())
        .collect();
    assert_eq!(ids, vec![vec![1, 2], vec![1, 2], vec![1]]);
    assert_eq!(parts[2][0].property_value("Energy"), Some("4"));
}

#[test]
fn unlimited_and_empty_inputs_give_one_part() {
    assert_eq!(part_count(0, 0), 1);
    assert_eq!(part_count(0, 10), 1);
    assert_eq!(partition_records(records(7), 0).len(), 1);
    assert_eq!(partition_records(Vec::new(), 3), vec![Vec::new()]);
}

#[test]
fn writes_numbered_parts_only_when_split() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let single = build_documents(&header(), records(2), 5);
    let paths = write_documents(&out, "POD/1", "20241027100000", &single).unwrap();
    assert_eq!(paths, vec![out.join("[POD-1]_-_[20241027100000].json")]);

    let split = build_documents(&header(), records(3), 2);
    let paths = write_documents(&out, "POD/1", "20241027100001", &split).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "[POD-1]_-_[20241027100001]_1.json",
            "[POD-1]_-_[20241027100001]_2.json",
        ]
    );
    let second: Value = serde_json::from_str(&fs::read_to_string(&paths[1]).unwrap()).unwrap();
    assert_eq!(second["UrbanDataset"]["values"]["line"][0]["id"], json!(1));
}

#[test]
fn writes_conversion_report() {
    let dir = tempfile::tempdir().unwrap();
    let converted = FileReport {
        source: "in/meter.csv".into(),
        sha256: Some("ab".repeat(32)),
        status: FileStatus::Converted,
        rows_read: 3,
        records_emitted: 2,
        documents: vec!["out/[POD-1]_-_[20241027100000].json".into()],
        unmatched_headers: vec!["Note".to_string()],
        dropped: vec![DropEntry {
            id: 3,
            key: PeriodKey::Start,
            raw: "2024-03-31T02:30:00".to_string(),
            reason: DropReason::Gap,
        }],
        error: None,
    };
    let failed = FileReport::failed("in/broken.csv", "source header is empty");
    let generated_at = Utc.with_ymd_and_hms(2024, 10, 27, 9, 0, 0).unwrap();

    let path = write_conversion_report(dir.path(), "meters", generated_at, &[converted, failed])
        .unwrap();

    assert_eq!(path, dir.path().join(REPORT_FILE_NAME));
    let report: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["schema"], json!(REPORT_SCHEMA));
    assert_eq!(report["generated_at"], json!("2024-10-27T09:00:00+00:00"));
    assert_eq!(report["extraction_name"], json!("meters"));
    let files = report["files"].as_array().unwrap();
    assert_eq!(files[0]["documents_written"], json!(1));
    assert_eq!(files[0]["dropped_count"], json!(1));
    assert_eq!(
        files[0]["dropped"][0],
        json!({
            "id": 3,
            "key": "start_ts",
            "raw": "2024-03-31T02:30:00",
            "reason": "gap in timezone rules"
        })
    );
    assert_eq!(files[1]["status"], json!("failed"));
    assert_eq!(files[1]["error"], json!("source header is empty"));
    assert!(files[1].get("sha256").is_none());
}

proptest! {
    #[test]
    fn partition_sizes_follow_ceiling(total in 0usize..200, max_rows in 1usize..50) {
        let parts = partition_records(records(total), max_rows);
        prop_assert_eq!(parts.len(), part_count(total, max_rows));
        prop_assert_eq!(parts.iter().map(Vec::len).sum::<usize>(), total);
        for part in &parts {
            prop_assert!(part.len() <= max_rows);
            let ids: Vec<usize> = part.iter().map(|record| record.id).collect();
            let expected: Vec<usize> = (1..=part.len()).collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
