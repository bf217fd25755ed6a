//! Records flowing through the conversion engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Coordinates;

/// One source row as ordered string cells with its 1-based output id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: usize,
    pub fields: Vec<String>,
}

impl RawRecord {
    pub fn new(id: usize, fields: Vec<String>) -> Self {
        Self { id, fields }
    }

    /// Cell at `index`, or an empty string for short rows.
    pub fn cell(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", String::as_str)
    }
}

/// Timestamp keys carried by a [`Period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeriodKey {
    #[serde(rename = "start_ts")]
    Start,
    #[serde(rename = "end_ts")]
    End,
}

impl PeriodKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start_ts",
            Self::End => "end_ts",
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start/end timestamp pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(rename = "start_ts", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(rename = "end_ts", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl Period {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Same timestamp for both ends.
    pub fn instant(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            start: Some(value.clone()),
            end: Some(value),
        }
    }

    pub fn get(&self, key: PeriodKey) -> Option<&str> {
        match key {
            PeriodKey::Start => self.start.as_deref(),
            PeriodKey::End => self.end.as_deref(),
        }
    }

    pub fn set(&mut self, key: PeriodKey, value: String) {
        match key {
            PeriodKey::Start => self.start = Some(value),
            PeriodKey::End => self.end = Some(value),
        }
    }
}

/// A `(name, val)` pair of a resolved record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: String,
    pub val: String,
}

impl PropertyValue {
    pub fn new(name: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            val: val.into(),
        }
    }
}

/// A record ready to be written into an output document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default)]
    pub property: Vec<PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ResolvedRecord {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property
            .iter()
            .any(|prop| prop.name.eq_ignore_ascii_case(name))
    }

    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|prop| prop.name == name)
            .map(|prop| prop.val.as_str())
    }

    pub fn push_property(&mut self, name: impl Into<String>, val: impl Into<String>) {
        self.property.push(PropertyValue::new(name, val));
    }
}

/// Reassign ids as a dense 1-based sequence in current order.
pub fn renumber(records: &mut [ResolvedRecord]) {
    for (index, record) in records.iter_mut().enumerate() {
        record.id = index + 1;
    }
}
