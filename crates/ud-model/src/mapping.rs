//! Mapping configuration.
//!
//! A mapping configuration is a JSON document describing how one family of
//! source files maps onto the dataset document: the specification/context
//! templates, one [`MappingRule`] per source header, and the period layout.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::document::{Context, Specification};
use crate::error::{ModelError, Result};
use crate::function::{ValueFunction, deserialize_function};

/// Slice used when the configuration does not declare one.
pub const DEFAULT_SLICE: i32 = -1;

/// How one source header maps onto a canonical property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    /// Canonical target name.
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_function")]
    pub function: Option<ValueFunction>,
    /// Canonical name fed by the same column when the cell is negative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_for_negative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_value: Option<String>,
    #[serde(default)]
    pub coordinates: bool,
}

impl MappingRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_function(mut self, token: &str) -> Self {
        self.function = ValueFunction::parse(token);
        self
    }

    #[must_use]
    pub fn with_negative(mut self, name: impl Into<String>) -> Self {
        self.name_for_negative = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_alternative(mut self, value: impl Into<String>) -> Self {
        self.alternative_value = Some(value.into());
        self
    }

    /// Companion name, ignoring blank values.
    pub fn negative_name(&self) -> Option<&str> {
        self.name_for_negative
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// True if `name` is this rule's canonical or companion name.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .negative_name()
                .is_some_and(|negative| negative.eq_ignore_ascii_case(name))
    }
}

/// Free-form configuration keys of a mapping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configurations {
    /// Date column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Period column names.
    #[serde(default)]
    pub period: Vec<String>,
    #[serde(default = "default_slice", deserialize_with = "deserialize_slice")]
    pub slice: i32,
    /// Canonical name to default value, appended when a record lacks the name.
    #[serde(default)]
    pub nulls_field: BTreeMap<String, Value>,
}

impl Default for Configurations {
    fn default() -> Self {
        Self {
            date: None,
            period: Vec::new(),
            slice: DEFAULT_SLICE,
            nulls_field: BTreeMap::new(),
        }
    }
}

impl Configurations {
    /// Null-field defaults rendered as strings.
    pub fn null_defaults(&self) -> Vec<(String, String)> {
        self.nulls_field
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    Value::String(text) => text.clone(),
                    Value::Null => "null".to_string(),
                    other => other.to_string(),
                };
                (name.clone(), rendered)
            })
            .collect()
    }

    pub fn period_config(&self, slot_mode: bool) -> PeriodConfig {
        PeriodConfig {
            date_column: self
                .date
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            period_columns: self.period.clone(),
            slice: self.slice,
            slot_mode,
        }
    }
}

fn default_slice() -> i32 {
    DEFAULT_SLICE
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SliceValue {
    Int(i64),
    Float(f64),
    Text(String),
}

fn deserialize_slice<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<SliceValue> = Option::deserialize(deserializer)?;
    let parsed = match value {
        None => Some(DEFAULT_SLICE),
        Some(SliceValue::Int(value)) => i32::try_from(value).ok(),
        Some(SliceValue::Float(value)) if value.fract() == 0.0 => {
            i32::try_from(value as i64).ok()
        }
        Some(SliceValue::Float(_)) => None,
        Some(SliceValue::Text(text)) => text.trim().parse::<i32>().ok(),
    };
    Ok(parsed.unwrap_or_else(|| {
        warn!(default = DEFAULT_SLICE, "invalid slice value, using default");
        DEFAULT_SLICE
    }))
}

/// Period layout of a source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodConfig {
    pub date_column: Option<String>,
    pub period_columns: Vec<String>,
    /// `< 0` explicit range, `0` instantaneous, `> 0` slot index in minutes.
    pub slice: i32,
    /// Two-rows-per-date daily profile.
    pub slot_mode: bool,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            date_column: None,
            period_columns: Vec::new(),
            slice: DEFAULT_SLICE,
            slot_mode: false,
        }
    }
}

/// A complete mapping configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub specification: Specification,
    #[serde(default)]
    pub context: Context,
    /// Source header name to rule.
    #[serde(default)]
    pub mappings: BTreeMap<String, MappingRule>,
    #[serde(default)]
    pub configurations: Configurations,
}

impl PropertyConfig {
    /// Rules in source-header order.
    pub fn rules(&self) -> impl Iterator<Item = &MappingRule> {
        self.mappings.values()
    }

    /// First rule answering to `name` through its canonical or companion name.
    pub fn rule_for(&self, name: &str) -> Option<&MappingRule> {
        self.rules().find(|rule| rule.answers_to(name))
    }

    /// Source header whose rule maps onto canonical `name`.
    pub fn source_for(&self, name: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|(_, rule)| rule.name.eq_ignore_ascii_case(name))
            .map(|(source, _)| source.as_str())
    }

    /// Log every rule whose function token could not be interpreted.
    pub fn report_unknown_functions(&self) -> usize {
        let mut count = 0;
        for (source, rule) in &self.mappings {
            if let Some(ValueFunction::Unknown(token)) = &rule.function {
                warn!(
                    source = %source,
                    name = %rule.name,
                    function = %token,
                    "unknown value function, values pass through unchanged"
                );
                count += 1;
            }
        }
        count
    }
}

/// Load a mapping configuration from a JSON file.
pub fn load_property_config(path: &Path) -> Result<PropertyConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    let config: PropertyConfig =
        serde_json::from_str(&content).map_err(|source| ModelError::MappingJson {
            path: path.to_path_buf(),
            source,
        })?;
    if config.mappings.is_empty() {
        return Err(ModelError::EmptyMappings {
            path: path.to_path_buf(),
        });
    }
    config.report_unknown_functions();
    Ok(config)
}
