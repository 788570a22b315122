//! The read-only grid the engine scans
//!
//! [`Grid`] is the boundary to file decoders. The engine only ever reads
//! through it, so any source of sheets and already-evaluated cell values can
//! be extracted from.

use cellmap_core::{CellValue, Workbook};

use crate::scan_order::{ScanKey, ScanOrder};

/// Ordered sheets of sparse, already-evaluated cells
pub trait Grid {
    /// Sheet names in document order
    fn sheet_names(&self) -> Vec<&str>;

    /// Value of one cell, `None` when blank or when the sheet is unknown
    fn value(&self, sheet: &str, row: u32, col: u16) -> Option<&CellValue>;

    /// Populated cells of a sheet in row-major order
    fn cells<'a>(&'a self, sheet: &str) -> Box<dyn Iterator<Item = (u32, u16, &'a CellValue)> + 'a>;

    /// Index of the last populated row of a sheet
    fn last_row(&self, sheet: &str) -> Option<u32>;

    /// Index of the last populated column of one row
    fn last_col_in_row(&self, sheet: &str, row: u32) -> Option<u16>;
}

impl Grid for Workbook {
    fn sheet_names(&self) -> Vec<&str> {
        Workbook::sheet_names(self).collect()
    }

    fn value(&self, sheet: &str, row: u32, col: u16) -> Option<&CellValue> {
        self.worksheet_by_name(sheet)?.cell_at(row, col)
    }

    fn cells<'a>(&'a self, sheet: &str) -> Box<dyn Iterator<Item = (u32, u16, &'a CellValue)> + 'a> {
        match self.worksheet_by_name(sheet) {
            Some(ws) => Box::new(ws.iter_cells()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn last_row(&self, sheet: &str) -> Option<u32> {
        self.worksheet_by_name(sheet)?.last_row()
    }

    fn last_col_in_row(&self, sheet: &str, row: u32) -> Option<u16> {
        self.worksheet_by_name(sheet)?.last_col_in_row(row)
    }
}

impl<G: Grid + ?Sized> Grid for &G {
    fn sheet_names(&self) -> Vec<&str> {
        (**self).sheet_names()
    }

    fn value(&self, sheet: &str, row: u32, col: u16) -> Option<&CellValue> {
        (**self).value(sheet, row, col)
    }

    fn cells<'a>(&'a self, sheet: &str) -> Box<dyn Iterator<Item = (u32, u16, &'a CellValue)> + 'a> {
        (**self).cells(sheet)
    }

    fn last_row(&self, sheet: &str) -> Option<u32> {
        (**self).last_row(sheet)
    }

    fn last_col_in_row(&self, sheet: &str, row: u32) -> Option<u16> {
        (**self).last_col_in_row(sheet, row)
    }
}

/// A grid read through a scan order, addressable by [`ScanKey`]
pub struct ScanGrid<'a, G: ?Sized> {
    grid: &'a G,
    order: &'a ScanOrder,
}

impl<'a, G: ?Sized> Clone for ScanGrid<'a, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, G: ?Sized> Copy for ScanGrid<'a, G> {}

impl<'a, G: Grid + ?Sized> ScanGrid<'a, G> {
    pub fn new(grid: &'a G, order: &'a ScanOrder) -> Self {
        Self { grid, order }
    }

    /// Value stored at `key`, `None` when blank or unreachable
    pub fn value(&self, key: ScanKey) -> Option<&'a CellValue> {
        let sheet = self.order.sheet_name(key.sheet)?;
        self.grid.value(sheet, key.row, key.col)
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    pub fn order(&self) -> &'a ScanOrder {
        self.order
    }
}

/// The cell the scan is currently visiting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitedCell<'a> {
    pub key: ScanKey,
    pub value: &'a CellValue,
}

impl<'a> VisitedCell<'a> {
    pub fn new(key: ScanKey, value: &'a CellValue) -> Self {
        Self { key, value }
    }
}
