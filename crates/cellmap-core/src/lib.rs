//! # cellmap-core
//!
//! Grid model for the cellmap record extractor.
//!
//! This crate provides the read-only document model the extraction engine
//! scans:
//! - [`CellValue`] - Already-evaluated scalar cell values
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing within a sheet
//! - [`CellCoordinate`] - A sheet-qualified cell position
//! - [`Workbook`], [`Worksheet`] - Ordered sheets of sparse cells
//!
//! ## Example
//!
//! ```rust
//! use cellmap_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! // Using string addresses
//! sheet.set_cell_value("A1", "Invoice").unwrap();
//! sheet.set_cell_value("B1", 42.0).unwrap();
//!
//! // Or using row/column indices (0-based)
//! sheet.set_cell_value_at(1, 0, CellValue::string("Total")).unwrap();
//! sheet.set_cell_value_at(1, 1, CellValue::Number(3.5)).unwrap();
//!
//! assert_eq!(sheet.last_row(), Some(1));
//! ```

pub mod cell;
pub mod error;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellCoordinate, CellRange, CellValue, SharedString, StringPool};
pub use error::{Error, Result};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
