//! Per-field cursors and the resolver that advances them
//!
//! The scan visits populated cells in increasing [`ScanKey`] order and asks
//! every field what it contributes at that cell. Scan-addressed fields answer
//! by comparing coordinates. List-addressed fields keep a cursor into their
//! sorted entries and only ever binary search forward from it, so the cursor
//! never moves backwards during a scan.
//!
//! Resolution has no error case: "nothing here" is `value: None`.

use cellmap_core::CellValue;
use once_cell::unsync::OnceCell;

use crate::grid::{Grid, ScanGrid, VisitedCell};
use crate::index::{ConstantSource, FieldId, IndexedField, ListEntry, Plan};
use crate::scan_order::ScanKey;

/// What a field contributes at the visited cell
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Option<CellValue>,
    /// The visited cell is the field's own source cell, not merely the
    /// nearest one before it
    pub at_location: bool,
}

impl Resolution {
    pub fn none() -> Self {
        Self {
            value: None,
            at_location: false,
        }
    }

    pub fn exact(value: CellValue) -> Self {
        Self {
            value: Some(value),
            at_location: true,
        }
    }

    pub fn nearby(value: CellValue) -> Self {
        Self {
            value: Some(value),
            at_location: false,
        }
    }

    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }
}

/// Scan state of one field
#[derive(Debug, Default)]
pub struct Cursor {
    /// Index into the field's sorted list entries
    pub position: usize,
    /// The value at `position` already went into an emitted record
    pub used_previous_value: bool,
    /// A constant's value, read at most once per scan
    memo: OnceCell<Option<CellValue>>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance_to(&mut self, position: usize) {
        if position != self.position {
            self.position = position;
            self.used_previous_value = false;
        }
    }
}

/// Cursors of every field of one scan, indexed by [`FieldId`]
#[derive(Debug, Default)]
pub struct CursorTable {
    cursors: Vec<Cursor>,
}

impl CursorTable {
    pub fn new(fields: usize) -> Self {
        Self {
            cursors: (0..fields).map(|_| Cursor::new()).collect(),
        }
    }

    pub fn get(&self, id: FieldId) -> &Cursor {
        &self.cursors[id.0]
    }

    pub fn get_mut(&mut self, id: FieldId) -> &mut Cursor {
        &mut self.cursors[id.0]
    }

    /// Record that the field's current value went into an emitted record
    ///
    /// Cleared again when the field's cursor moves to another entry.
    pub fn mark_used(&mut self, id: FieldId) {
        self.cursors[id.0].used_previous_value = true;
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

/// Resolve `field` at the visited cell, advancing its cursor
pub fn resolve<G: Grid + ?Sized>(
    field: &IndexedField,
    cursor: &mut Cursor,
    visited: &VisitedCell<'_>,
    grid: &ScanGrid<'_, G>,
) -> Resolution {
    let at = visited.key;
    match field.plan() {
        Plan::Constant(source) => resolve_constant(field, source, cursor, grid),
        Plan::ColumnScan {
            sheet,
            col,
            first_row,
        } => {
            if sheet.map_or(false, |s| s != at.sheet) || at.col != *col || at.row < *first_row {
                return Resolution::none();
            }
            Resolution::exact(visited.value.clone())
        }
        Plan::RowScan { sheet, row } => {
            // Column 0 holds the row's label, not data
            if sheet.map_or(false, |s| s != at.sheet) || at.row != *row || at.col < 1 {
                return Resolution::none();
            }
            Resolution::exact(visited.value.clone())
        }
        Plan::List(entries) => resolve_list(field, entries, cursor, visited, grid),
        Plan::Void => Resolution::none(),
    }
}

/// Resolve a constant without a visited cell
///
/// The value is read from the grid the first time and memoized in the
/// cursor, whatever cell is being visited.
pub fn resolve_constant<G: Grid + ?Sized>(
    field: &IndexedField,
    source: &ConstantSource,
    cursor: &mut Cursor,
    grid: &ScanGrid<'_, G>,
) -> Resolution {
    let value = cursor.memo.get_or_init(|| match source {
        ConstantSource::Value(v) => Some(v.clone()),
        ConstantSource::Cell(key) if key.sheet.is_reachable() => {
            Some(grid.value(*key).cloned().unwrap_or_default())
        }
        ConstantSource::Cell(_) => {
            tracing::warn!("Constant field '{}' points at an unscanned sheet", field.name());
            None
        }
    });

    match value {
        None => Resolution::none(),
        Some(_) if field.is_metric() && cursor.used_previous_value => Resolution::none(),
        Some(v) => Resolution::exact(v.clone()),
    }
}

fn resolve_list<G: Grid + ?Sized>(
    field: &IndexedField,
    entries: &[ListEntry],
    cursor: &mut Cursor,
    visited: &VisitedCell<'_>,
    grid: &ScanGrid<'_, G>,
) -> Resolution {
    let pos = cursor.position;
    let Some(target) = entries.get(pos) else {
        return Resolution::none();
    };

    if target.key == visited.key {
        if field.is_metric() && cursor.used_previous_value {
            return Resolution::none();
        }
        return Resolution::exact(entry_value(target, grid).unwrap_or_else(|| visited.value.clone()));
    }

    match entries[pos..].binary_search_by(|e| e.key.cmp(&visited.key)) {
        Ok(found) => {
            let i = pos + found;
            cursor.advance_to(i);
            let entry = &entries[i];
            Resolution::exact(entry_value(entry, grid).unwrap_or_else(|| visited.value.clone()))
        }
        // Before any entry not yet reached
        Err(0) => Resolution::none(),
        Err(insert_at) => {
            let i = pos + insert_at - 1;
            cursor.advance_to(i);
            let entry = &entries[i];
            // Groups never carry over into the next sheet
            if entry.key.sheet != visited.key.sheet {
                return Resolution::none();
            }
            if field.is_metric() && cursor.used_previous_value {
                return Resolution::none();
            }
            match entry_value(entry, grid) {
                Some(value) => Resolution::nearby(value),
                None => Resolution::none(),
            }
        }
    }
}

fn entry_value<G: Grid + ?Sized>(entry: &ListEntry, grid: &ScanGrid<'_, G>) -> Option<CellValue> {
    match &entry.value {
        Some(v) => Some(v.clone()),
        None => grid.value(entry.key).cloned(),
    }
}

/// Key of the entry a list field's cursor currently points at
pub fn cursor_key(field: &IndexedField, cursor: &Cursor) -> Option<ScanKey> {
    match field.plan() {
        Plan::List(entries) => entries.get(cursor.position).map(|e| e.key),
        _ => None,
    }
}
