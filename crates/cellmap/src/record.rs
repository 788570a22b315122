//! Assembled output records

use std::sync::Arc;

use cellmap_core::CellValue;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Where a record was assembled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordOrigin {
    pub sheet: Option<String>,
    pub row: Option<u32>,
    pub col: Option<u16>,
}

/// One logical record
///
/// Every configured field is present. A field with nothing to contribute
/// maps to `None` rather than being left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<[String]>,
    values: Vec<Option<CellValue>>,
    origin: RecordOrigin,
}

impl Record {
    pub(crate) fn new(
        schema: Arc<[String]>,
        values: Vec<Option<CellValue>>,
        origin: RecordOrigin,
    ) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self {
            schema,
            values,
            origin,
        }
    }

    /// Value of a field, `None` when absent or not a field of this record
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.position(field)
            .and_then(|i| self.values[i].as_ref())
    }

    /// Whether `field` is one of the record's fields, with or without a value
    pub fn contains_field(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// Field names in configuration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.iter().map(String::as_str)
    }

    /// Values in configuration order
    pub fn values(&self) -> &[Option<CellValue>] {
        &self.values
    }

    /// `(field, value)` pairs in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&CellValue>)> {
        self.schema
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_ref))
    }

    pub fn origin(&self) -> &RecordOrigin {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.schema.iter().position(|name| name == field)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
