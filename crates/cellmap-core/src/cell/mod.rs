//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The scalar value stored in a cell
//! - [`CellAddress`] - A cell's location within a sheet (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`CellCoordinate`] - A cell's location within a workbook (e.g., "Data!A1")
//! - [`CellStorage`] - Sparse row-major cell storage

mod address;
mod coordinate;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use coordinate::CellCoordinate;
pub use storage::CellStorage;
pub use value::{CellValue, SharedString, StringPool};
