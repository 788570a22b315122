//! Field addressing configuration
//!
//! Configurations are usually loaded from JSON:
//!
//! ```
//! use cellmap::config::ExtractConfig;
//!
//! let config = ExtractConfig::from_json_str(r#"{
//!     "fields": [
//!         {"name": "taxpayer", "sheet": "Header", "row": 0, "col": 1},
//!         {"name": "amount", "col": 2, "first_row": 1, "type": "number"},
//!         {"name": "section", "cells": ["Data!A3", "Data!A6"]}
//!     ],
//!     "options": {"record_limit": 100}
//! }"#).unwrap();
//!
//! assert_eq!(config.fields.len(), 3);
//! assert!(config.fields[1].is_metric());
//! ```
//!
//! The same structures can be built in code with the builder methods on
//! [`FieldConfig`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use cellmap_core::{CellAddress, CellCoordinate, CellRange, CellValue};
use serde::{Deserialize, Serialize};

use crate::error::ExtractResult;

/// A whole extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub options: ExtractOptions,
}

impl ExtractConfig {
    pub fn from_json_str(json: &str) -> ExtractResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> ExtractResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ExtractResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

/// Options for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractOptions {
    /// Stop after this many records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_limit: Option<usize>,
    /// Explicit sheet scan order. Defaults to the grid's document order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_order: Option<Vec<String>>,
}

impl ExtractOptions {
    pub fn with_record_limit(mut self, limit: usize) -> Self {
        self.record_limit = Some(limit);
        self
    }

    pub fn with_sheet_order<I, S>(mut self, sheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sheet_order = Some(sheets.into_iter().map(Into::into).collect());
        self
    }
}

/// Declared value type of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Text,
    Boolean,
    #[default]
    Any,
}

/// A sheet named directly or by its 0-based position in the scan order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(usize),
    Name(String),
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        SheetRef::Name(name.to_string())
    }
}

impl From<String> for SheetRef {
    fn from(name: String) -> Self {
        SheetRef::Name(name)
    }
}

impl From<usize> for SheetRef {
    fn from(index: usize) -> Self {
        SheetRef::Index(index)
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Index(i) => write!(f, "#{}", i),
            SheetRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A cell reference such as `A1`, `Data!B3` or `'My Sheet'!C4`
///
/// Without a sheet prefix the field's own sheet applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    pub sheet: Option<String>,
    pub address: CellAddress,
}

impl CellRef {
    /// A reference on a named sheet
    pub fn on<S: Into<String>>(sheet: S, row: u32, col: u16) -> Self {
        Self {
            sheet: Some(sheet.into()),
            address: CellAddress::new(row, col),
        }
    }

    /// A reference on the field's own sheet
    pub fn local(row: u32, col: u16) -> Self {
        Self {
            sheet: None,
            address: CellAddress::new(row, col),
        }
    }

    pub fn parse(s: &str) -> cellmap_core::Result<Self> {
        let (sheet, rest) = CellCoordinate::split_sheet_prefix(s)?;
        Ok(Self {
            sheet,
            address: CellAddress::parse(rest)?,
        })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", CellCoordinate::quote_sheet_name(sheet))?;
        }
        write!(f, "{}", self.address)
    }
}

impl FromStr for CellRef {
    type Err = cellmap_core::Error;

    fn from_str(s: &str) -> cellmap_core::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CellRef {
    type Error = cellmap_core::Error;

    fn try_from(s: String) -> cellmap_core::Result<Self> {
        Self::parse(&s)
    }
}

impl From<CellRef> for String {
    fn from(r: CellRef) -> Self {
        r.to_string()
    }
}

/// A range reference such as `B2:D9` or `Data!B2:D9`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeRef {
    pub sheet: Option<String>,
    pub range: CellRange,
}

impl RangeRef {
    pub fn new(sheet: Option<String>, range: CellRange) -> Self {
        Self { sheet, range }
    }

    pub fn parse(s: &str) -> cellmap_core::Result<Self> {
        let (sheet, rest) = CellCoordinate::split_sheet_prefix(s)?;
        Ok(Self {
            sheet,
            range: CellRange::parse(rest)?,
        })
    }

    /// Cell references covered by the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.range.cells().map(move |address| CellRef {
            sheet: self.sheet.clone(),
            address,
        })
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", CellCoordinate::quote_sheet_name(sheet))?;
        }
        write!(f, "{}", self.range)
    }
}

impl FromStr for RangeRef {
    type Err = cellmap_core::Error;

    fn from_str(s: &str) -> cellmap_core::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RangeRef {
    type Error = cellmap_core::Error;

    fn try_from(s: String) -> cellmap_core::Result<Self> {
        Self::parse(&s)
    }
}

impl From<RangeRef> for String {
    fn from(r: RangeRef) -> Self {
        r.to_string()
    }
}

/// A value extracted ahead of time, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueEntry {
    pub at: CellRef,
    pub value: CellValue,
}

/// Raw addressing configuration of one field
///
/// Which of the optional parts are set decides how the field is addressed,
/// see [`crate::field::Field::spec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<SheetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_row: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<CellRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<RangeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ValueEntry>,
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    /// Overrides the metric default derived from `value_type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<bool>,
    /// Nesting depth, used when row and column grouping are mixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl FieldConfig {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn sheet<S: Into<SheetRef>>(mut self, sheet: S) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn row(mut self, row: u32) -> Self {
        self.row = Some(row);
        self
    }

    pub fn col(mut self, col: u16) -> Self {
        self.col = Some(col);
        self
    }

    pub fn first_row(mut self, first_row: u32) -> Self {
        self.first_row = Some(first_row);
        self
    }

    pub fn cell(mut self, cell: CellRef) -> Self {
        self.cells.push(cell);
        self
    }

    pub fn cells<I: IntoIterator<Item = CellRef>>(mut self, cells: I) -> Self {
        self.cells.extend(cells);
        self
    }

    pub fn range(mut self, range: RangeRef) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn value_at<V: Into<CellValue>>(mut self, at: CellRef, value: V) -> Self {
        self.values.push(ValueEntry {
            at,
            value: value.into(),
        });
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn metric(mut self, metric: bool) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Whether consumed values of this field must not be reused
    ///
    /// Numeric fields are metrics unless configured otherwise.
    pub fn is_metric(&self) -> bool {
        self.metric
            .unwrap_or(self.value_type == ValueType::Number)
    }
}
