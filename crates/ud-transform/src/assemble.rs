//! Row assembly: from a source row to a [`ResolvedRecord`].

use tracing::warn;

use ud_map::{HeaderIndex, LineValues, ValueEngine, line_values, parse_number};
use ud_model::{Coordinates, Period, PropertyConfig, RawRecord, ResolvedRecord};

/// Builds records for one source file.
#[derive(Debug, Clone)]
pub struct RowAssembler<'a> {
    index: &'a HeaderIndex,
    engine: ValueEngine<'a>,
    value_names: Vec<&'a str>,
    coordinates: bool,
    null_defaults: Vec<(String, String)>,
}

impl<'a> RowAssembler<'a> {
    pub fn new(config: &'a PropertyConfig, index: &'a HeaderIndex) -> Self {
        Self {
            index,
            engine: ValueEngine::new(config),
            value_names: config.specification.value_property_names(),
            coordinates: config.specification.declares_coordinates(),
            null_defaults: config.configurations.null_defaults(),
        }
    }

    /// Assemble one record.
    ///
    /// When `column` is given, that physical column's value is emitted first
    /// under the canonical name it is read as; the remaining value properties
    /// follow, then coordinates and null-field defaults.
    pub fn assemble(
        &self,
        id: usize,
        row: &RawRecord,
        period: Option<Period>,
        column: Option<usize>,
    ) -> ResolvedRecord {
        let line = line_values(self.index, row);
        let mut record = ResolvedRecord::new(id);
        record.period = period;

        let mut leading = None;
        if let Some(column) = column {
            let raw = row.cell(column);
            if let Some(name) = self.index.name_for_column(column, raw) {
                record.push_property(name, self.engine.apply(name, raw));
                leading = Some(name);
            }
        }

        for property in &self.value_names {
            if leading.is_some_and(|name| name.eq_ignore_ascii_case(property)) {
                continue;
            }
            for (name, raw) in &line {
                if name.eq_ignore_ascii_case(property) {
                    record.push_property(name.as_str(), self.engine.apply(name, raw));
                }
            }
        }

        if self.coordinates {
            record.coordinates = Some(coordinates_from_line(&line, id));
        }
        self.append_null_defaults(&mut record);
        record
    }

    /// Append defaults for names the record does not carry yet.
    pub fn append_null_defaults(&self, record: &mut ResolvedRecord) {
        for (name, value) in &self.null_defaults {
            if !record.has_property(name) {
                record.push_property(name.as_str(), value.as_str());
            }
        }
    }

    pub fn engine(&self) -> ValueEngine<'a> {
        self.engine
    }
}

fn line_lookup<'l>(line: &'l LineValues, name: &str) -> Option<&'l str> {
    line.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn coordinate(line: &LineValues, name: &str, id: usize) -> f64 {
    let Some(raw) = line_lookup(line, name).map(str::trim).filter(|raw| !raw.is_empty()) else {
        return 0.0;
    };
    parse_number(&raw.replace(',', ".")).unwrap_or_else(|| {
        warn!(id, coordinate = %name, value = %raw, "unparsable coordinate, using 0.0");
        0.0
    })
}

/// Coordinates read from a row, defaulting to `WGS84-DD` at 0.0.
fn coordinates_from_line(line: &LineValues, id: usize) -> Coordinates {
    let format = line_lookup(line, "format")
        .map(str::trim)
        .filter(|format| !format.is_empty() && *format != "null")
        .map_or_else(|| Coordinates::DEFAULT_FORMAT.to_string(), str::to_string);
    Coordinates {
        format,
        latitude: coordinate(line, "latitude", id),
        longitude: coordinate(line, "longitude", id),
        height: coordinate(line, "height", id),
    }
}
