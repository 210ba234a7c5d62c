// src/record.rs

use crate::error::ImageServerError;
use crate::identify::IdentifyResult;
use crate::raster::Raster;
use serde::Serialize;
use serde_json::Value;

/// Separator used when joining nested keys into column names.
pub const DEFAULT_SEPARATOR: &str = "_";

/// One flat output row: column names with their cell text, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatRecord {
    columns: Vec<(String, String)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, cell: impl Into<String>) {
        self.columns.push((column.into(), cell.into()));
    }

    /// Returns the cell text of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Flattens a nested JSON object into column/cell pairs.
///
/// Nested object keys are joined to their parent with `separator`
/// (`{"location": {"name": "A"}}` becomes `location_name`). Strings are taken
/// verbatim, `null` becomes an empty cell and arrays are written as JSON text.
/// A non-object value becomes a single column named `parent_key`.
pub fn flatten_value(value: &Value, parent_key: &str, separator: &str) -> FlatRecord {
    let mut record = FlatRecord::new();
    flatten_into(&mut record, value, parent_key, separator);
    record
}

fn flatten_into(record: &mut FlatRecord, value: &Value, parent_key: &str, separator: &str) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let new_key = if parent_key.is_empty() {
                    key.clone()
                } else {
                    format!("{}{}{}", parent_key, separator, key)
                };
                flatten_into(record, nested, &new_key, separator);
            }
        }
        other => record.push(parent_key, cell_text(other)),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Serializes any value and flattens it into a record.
pub fn to_flat_record<T: Serialize>(
    value: &T,
    separator: &str,
) -> Result<FlatRecord, ImageServerError> {
    let json = serde_json::to_value(value)?;
    Ok(flatten_value(&json, "", separator))
}

impl Raster {
    /// Flattens this raster into a CSV row (`location_name`, `location_coordinates_x`,
    /// `idp_issueddate`, `value`, `attributes_<name>`, ...).
    pub fn to_record(&self) -> Result<FlatRecord, ImageServerError> {
        to_flat_record(self, DEFAULT_SEPARATOR)
    }
}

impl IdentifyResult {
    /// Flattens all rasters of this result, in raster order.
    pub fn to_records(&self) -> Result<Vec<FlatRecord>, ImageServerError> {
        self.rasters.iter().map(Raster::to_record).collect()
    }
}
