//! # cellmap
//!
//! Turns sheets of cells into a stream of flat records.
//!
//! Each output field is described by a [`FieldConfig`] saying where its
//! values live: a fixed cell, a whole column or row, or an explicit list of
//! cells. The [`Extractor`] scans the populated cells of a [`Grid`] once, in
//! sheet, row, column order, and resolves every field at every visited cell.
//! Records are delimited by where fields find their values at their own
//! source cell, and values of numeric ("metric") fields are consumed so each
//! reaches a single record while descriptive ("dimension") values repeat.
//!
//! ## Example
//!
//! ```rust
//! use cellmap::prelude::*;
//!
//! let mut workbook = Workbook::empty();
//! let sheet = Worksheet::from_rows(
//!     "Invoice",
//!     vec![
//!         vec![CellValue::from("customer"), CellValue::from("ACME")],
//!         vec![CellValue::from("item"), CellValue::from("qty")],
//!         vec![CellValue::from("bolt"), CellValue::Number(4.0)],
//!         vec![CellValue::from("nut"), CellValue::Number(9.0)],
//!     ],
//! )
//! .unwrap();
//! workbook.add_existing_worksheet(sheet).unwrap();
//!
//! let extractor = Extractor::new([
//!     FieldConfig::new("customer").row(0).col(1),
//!     FieldConfig::new("item").col(0).first_row(2),
//!     FieldConfig::new("qty").col(1).first_row(2).value_type(ValueType::Number),
//! ]);
//!
//! let records: Vec<Record> = extractor.extract(&workbook).unwrap().collect();
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].get("customer"), Some(&CellValue::string("ACME")));
//! assert_eq!(records[1].get("qty"), Some(&CellValue::Number(9.0)));
//! ```

pub mod assemble;
pub mod config;
pub mod cursor;
pub mod error;
pub mod extract;
pub mod field;
pub mod grid;
pub mod index;
pub mod prelude;
pub mod record;
pub mod scan_order;

// Re-export the grid model
pub use cellmap_core::{CellAddress, CellCoordinate, CellRange, CellValue, Workbook, Worksheet};

pub use assemble::Grouping;
pub use config::{CellRef, ExtractConfig, ExtractOptions, FieldConfig, RangeRef, SheetRef, ValueType};
pub use error::{ExtractError, ExtractResult, FieldIssue};
pub use extract::{ExpectedCount, Extractor, FieldReport, Records};
pub use grid::Grid;
pub use record::{Record, RecordOrigin};
pub use scan_order::ScanOrder;
