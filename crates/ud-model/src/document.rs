//! The output dataset document.
//!
//! Documents serialize as
//! `{"UrbanDataset": {"specification": .., "context": .., "values": {"line": [..]}}}`.
//! Template fields this model does not know about are kept in `extra` maps so
//! they survive a load/write cycle untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::ResolvedRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "schemeID", skip_serializing_if = "Option::is_none")]
    pub scheme_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubProperties {
    #[serde(rename = "propertyName", default)]
    pub property_name: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub property_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_properties: Option<SubProperties>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyDefinition {
    fn sub_property_names(&self) -> &[String] {
        self.sub_properties
            .as_ref()
            .map(|sub| sub.property_name.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    #[serde(default)]
    pub property_definition: Vec<PropertyDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Specification {
    fn definitions(&self) -> &[PropertyDefinition] {
        self.properties
            .as_ref()
            .map(|props| props.property_definition.as_slice())
            .unwrap_or_default()
    }

    /// Every name declared as a sub-property of some definition.
    pub fn sub_property_names(&self) -> Vec<&str> {
        self.definitions()
            .iter()
            .flat_map(PropertyDefinition::sub_property_names)
            .map(String::as_str)
            .collect()
    }

    /// Properties emitted as `(name, val)` pairs on each record.
    ///
    /// These are the definitions without sub-properties, minus any name that
    /// is itself a sub-property of another definition (period and coordinate
    /// parts are emitted elsewhere).
    pub fn value_property_names(&self) -> Vec<&str> {
        let subs = self.sub_property_names();
        self.definitions()
            .iter()
            .filter(|def| def.sub_properties.is_none())
            .map(|def| def.property_name.as_str())
            .filter(|name| !subs.contains(name))
            .collect()
    }

    /// True when any definition declares coordinate sub-properties.
    pub fn declares_coordinates(&self) -> bool {
        const COORDINATE_PARTS: [&str; 4] = ["format", "latitude", "longitude", "height"];
        self.sub_property_names().iter().any(|name| {
            COORDINATE_PARTS
                .iter()
                .any(|part| part.eq_ignore_ascii_case(name))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "schemeID", skip_serializing_if = "Option::is_none")]
    pub scheme_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default = "Coordinates::default_format")]
    pub format: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub height: f64,
}

impl Coordinates {
    pub const DEFAULT_FORMAT: &str = "WGS84-DD";

    fn default_format() -> String {
        Self::DEFAULT_FORMAT.to_string()
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self {
            format: Self::default_format(),
            latitude: 0.0,
            longitude: 0.0,
            height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<Producer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Context {
    pub fn producer_id(&self) -> Option<&str> {
        self.producer.as_ref().and_then(|p| p.id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Values {
    #[serde(default)]
    pub line: Vec<ResolvedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetBody {
    pub specification: Specification,
    pub context: Context,
    pub values: Values,
}

/// Root wrapper of a written document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    #[serde(rename = "UrbanDataset")]
    pub dataset: DatasetBody,
}

impl DatasetDocument {
    pub fn new(specification: Specification, context: Context, line: Vec<ResolvedRecord>) -> Self {
        Self {
            dataset: DatasetBody {
                specification,
                context,
                values: Values { line },
            },
        }
    }

    pub fn records(&self) -> &[ResolvedRecord] {
        &self.dataset.values.line
    }
}
