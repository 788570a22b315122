//! Cell storage implementation
//!
//! This module provides sparse storage for worksheet cells.
//! Only non-empty cells are stored, using a row-based BTreeMap structure.

use std::collections::BTreeMap;

use super::{CellValue, StringPool};

/// Sparse row-based storage for worksheet cells
///
/// - Uses BTreeMap for ordered iteration (the extraction scan is row-major)
/// - Only stores non-empty cells (sparse)
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellValue>>`
#[derive(Debug, Default)]
pub struct CellStorage {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u16, CellValue>>,

    /// Shared string pool for deduplication
    string_pool: StringPool,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell value
    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Set a cell value
    ///
    /// Setting [`CellValue::Empty`] removes the cell. Strings are interned.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        let value = match value {
            CellValue::Empty => {
                self.remove(row, col);
                return;
            }
            CellValue::String(s) => CellValue::String(self.string_pool.intern(s.as_str())),
            other => other,
        };
        self.rows.entry(row).or_default().insert(col, value);
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellValue> {
        let row_map = self.rows.get_mut(&row)?;
        let result = row_map.remove(&col);

        // Clean up empty rows
        if row_map.is_empty() {
            self.rows.remove(&row);
        }

        result
    }

    /// Clear all cells
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the bounds of used cells
    ///
    /// Returns (min_row, min_col, max_row, max_col) or None if empty
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;

        let mut min_col = u16::MAX;
        let mut max_col = 0u16;

        for row_data in self.rows.values() {
            if let Some(&col) = row_data.keys().next() {
                min_col = min_col.min(col);
            }
            if let Some(&col) = row_data.keys().next_back() {
                max_col = max_col.max(col);
            }
        }

        Some((min_row, min_col, max_row, max_col))
    }

    /// Last populated row index
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Last populated column index in a row
    pub fn last_col_in_row(&self, row: u32) -> Option<u16> {
        self.rows.get(&row)?.keys().next_back().copied()
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellValue)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, value)| (row, col, value)))
    }

    /// Iterate over cells in a specific row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellValue)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, value)| (col, value)))
    }

    /// Iterate over row indices that have data
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Get the string pool
    pub fn string_pool(&self) -> &StringPool {
        &self.string_pool
    }
}
