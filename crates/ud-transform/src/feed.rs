//! Conversion of JSON feed objects into records.

use serde_json::Value;
use tracing::debug;

use ud_ingest::FeedObject;
use ud_map::ValueEngine;
use ud_model::{PropertyConfig, ResolvedRecord};

/// Attribute passed through as the record's raw timestamp.
pub const TIMESTAMP_ATTRIBUTE: &str = "timestamp";

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Convert feed objects, one record per object, ids from 1.
///
/// Each mapping rule whose source attribute is present yields a
/// `(canonical name, value)` pair through the value functions; absent
/// attributes are skipped. Null-field defaults fill the remaining names.
pub fn convert_feed(config: &PropertyConfig, objects: &[FeedObject]) -> Vec<ResolvedRecord> {
    let engine = ValueEngine::new(config);
    let defaults = config.configurations.null_defaults();
    objects
        .iter()
        .enumerate()
        .map(|(index, object)| {
            let mut record = ResolvedRecord::new(index + 1);
            record.timestamp = object.get(TIMESTAMP_ATTRIBUTE).map(render);
            for (source, rule) in &config.mappings {
                match object.get(source) {
                    Some(value) => {
                        let value = engine.apply(&rule.name, &render(value));
                        record.push_property(rule.name.as_str(), value);
                    }
                    None => debug!(id = record.id, attribute = %source, "feed object lacks attribute"),
                }
            }
            for (name, value) in &defaults {
                if !record.has_property(name) {
                    record.push_property(name.as_str(), value.as_str());
                }
            }
            record
        })
        .collect()
}
