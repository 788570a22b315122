//! Record assembly
//!
//! The assembler receives every field's [`Resolution`] at every visited cell
//! and decides where records begin and end. Each active field gets a role:
//!
//! - constants fill document-wide slots that are copied into every record;
//! - fields varying by row fill a row group, closed when the scan leaves the
//!   row;
//! - fields varying by column fill one group per column, closed when the scan
//!   leaves the sheet.
//!
//! When row and column fields are mixed, a field's role comes from the parity
//! of its nesting depth: even depths group by row, odd depths by column. This
//! is a heuristic carried over for compatibility. Only two levels are
//! distinguished, so depths above 1 alternate roles without adding levels.
//!
//! Once a value is put into an emitted record the assembler marks the field
//! used. Metric values are also consumed from their group so they reach one
//! record only. Dimension values stay and repeat.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use cellmap_core::CellValue;

use crate::cursor::{CursorTable, Resolution};
use crate::index::{Axis, FieldId, IndexedField};
use crate::record::{Record, RecordOrigin};
use crate::scan_order::{ScanKey, SheetRank};

/// Which group a field's values are collected in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Document,
    Row,
    Column,
    /// Void fields, always absent
    Inactive,
}

/// How records are delimited for a set of fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grouping {
    /// One record per row with an at-location match
    Rows,
    /// One record per column with an at-location match, per sheet
    Columns,
    /// Rows split into one record per matched column
    Nested,
    /// A single record built from constants
    Document,
}

/// Assign a role to every field and derive the grouping
pub fn assign_roles(fields: &[IndexedField]) -> (Vec<Role>, Grouping) {
    let has_rows = fields.iter().any(|f| f.axis() == Axis::Rows);
    let has_columns = fields.iter().any(|f| f.axis() == Axis::Columns);
    let mixed = has_rows && has_columns;

    let roles: Vec<Role> = fields
        .iter()
        .map(|f| match f.axis() {
            Axis::Fixed => Role::Document,
            Axis::Unset => Role::Inactive,
            Axis::Rows | Axis::Columns if mixed => {
                if f.depth() % 2 == 0 {
                    Role::Row
                } else {
                    Role::Column
                }
            }
            Axis::Rows => Role::Row,
            Axis::Columns => Role::Column,
        })
        .collect();

    let grouping = match (roles.contains(&Role::Row), roles.contains(&Role::Column)) {
        (true, true) => Grouping::Nested,
        (true, false) => Grouping::Rows,
        (false, true) => Grouping::Columns,
        (false, false) => Grouping::Document,
    };
    tracing::debug!("Grouping records by {:?}", grouping);

    (roles, grouping)
}

#[derive(Debug, Clone, Default, PartialEq)]
enum Slot {
    #[default]
    Empty,
    Nearby(CellValue),
    Exact(CellValue),
}

impl Slot {
    /// An at-location value replaces anything but an earlier at-location
    /// value. A nearby value only fills an empty slot.
    ///
    /// Returns whether the value was taken.
    fn offer(&mut self, resolution: Resolution) -> bool {
        let Some(value) = resolution.value else {
            return false;
        };
        let replace = match self {
            Slot::Exact(_) => false,
            Slot::Nearby(_) => resolution.at_location,
            Slot::Empty => true,
        };
        if replace {
            *self = if resolution.at_location {
                Slot::Exact(value)
            } else {
                Slot::Nearby(value)
            };
        }
        replace
    }

    fn value(&self) -> Option<&CellValue> {
        match self {
            Slot::Empty => None,
            Slot::Nearby(v) | Slot::Exact(v) => Some(v),
        }
    }
}

#[derive(Debug, Clone)]
struct Group {
    slots: Vec<Slot>,
    /// Some field of this group matched at location
    exact: bool,
    /// Same, within the row being scanned (column groups only)
    exact_in_row: bool,
}

impl Group {
    fn new(fields: usize) -> Self {
        Self {
            slots: vec![Slot::Empty; fields],
            exact: false,
            exact_in_row: false,
        }
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = Slot::Empty);
        self.exact = false;
        self.exact_in_row = false;
    }
}

/// Collects resolutions into records
#[derive(Debug)]
pub struct Assembler {
    schema: Arc<[String]>,
    sheet_names: Vec<String>,
    roles: Vec<Role>,
    metric: Vec<bool>,
    grouping: Grouping,
    document: Vec<Slot>,
    row: Group,
    row_key: Option<(SheetRank, u32)>,
    columns: BTreeMap<u16, Group>,
    sheet: Option<SheetRank>,
    pending: VecDeque<Record>,
}

impl Assembler {
    /// `fields` must be indexed by position, `sheet_names` in scan order
    pub fn new(fields: &[IndexedField], sheet_names: Vec<String>) -> Self {
        let (roles, grouping) = assign_roles(fields);
        let n = fields.len();
        Self {
            schema: fields.iter().map(|f| f.name().to_string()).collect(),
            sheet_names,
            roles,
            metric: fields.iter().map(IndexedField::is_metric).collect(),
            grouping,
            document: vec![Slot::Empty; n],
            row: Group::new(n),
            row_key: None,
            columns: BTreeMap::new(),
            sheet: None,
            pending: VecDeque::new(),
        }
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn role(&self, id: FieldId) -> Role {
        self.roles[id.0]
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Called before the fields are resolved at `key`
    ///
    /// Closes the previous row (and sheet) when the scan has left it.
    pub fn enter(&mut self, key: ScanKey, cursors: &mut CursorTable) {
        let row_key = (key.sheet, key.row);
        if self.row_key.map_or(false, |k| k != row_key) {
            self.close_row(cursors);
        }
        if self.sheet.map_or(false, |s| s != key.sheet) {
            self.close_sheet(cursors);
        }
        self.row_key = Some(row_key);
        self.sheet = Some(key.sheet);
    }

    /// Record what field `id` resolved to at `key`
    ///
    /// Column groups are keyed by the visited column, so a nearby value
    /// continues into the columns after its source cell. A metric value taken
    /// by a column group is marked used at once, so it cannot also reach a
    /// later column before the records are emitted.
    pub fn observe(
        &mut self,
        id: FieldId,
        key: ScanKey,
        resolution: Resolution,
        cursors: &mut CursorTable,
    ) {
        if resolution.is_none() {
            return;
        }
        let exact = resolution.at_location;
        match self.roles[id.0] {
            Role::Document => {
                self.document[id.0].offer(resolution);
            }
            Role::Row => {
                self.row.slots[id.0].offer(resolution);
                self.row.exact |= exact;
            }
            Role::Column => {
                let n = self.roles.len();
                let group = self.columns.entry(key.col).or_insert_with(|| Group::new(n));
                if group.slots[id.0].offer(resolution) && self.metric[id.0] {
                    cursors.mark_used(id);
                }
                group.exact |= exact;
                group.exact_in_row |= exact;
            }
            Role::Inactive => {}
        }
    }

    /// Close the open row and sheet at the end of the scan
    pub fn close(&mut self, cursors: &mut CursorTable) {
        if self.row_key.is_some() {
            self.close_row(cursors);
        }
        if self.sheet.is_some() {
            self.close_sheet(cursors);
        }
    }

    /// Emit the single record of a constants-only extraction
    pub fn emit_document(&mut self, cursors: &mut CursorTable) {
        let values = self.compose(None, None);
        self.emit(values, RecordOrigin::default(), cursors);
    }

    /// Next assembled record, if any
    pub fn pop(&mut self) -> Option<Record> {
        self.pending.pop_front()
    }

    fn close_row(&mut self, cursors: &mut CursorTable) {
        let Some((sheet, row)) = self.row_key.take() else {
            return;
        };

        if self.row.exact {
            match self.grouping {
                Grouping::Rows => {
                    let values = self.compose(Some(self.row.slots.as_slice()), None);
                    let origin = self.origin(sheet, Some(row), None);
                    self.emit(values, origin, cursors);
                }
                Grouping::Nested => self.emit_nested_row(sheet, row, cursors),
                Grouping::Columns | Grouping::Document => {}
            }
        }

        self.row.clear();
        self.columns
            .values_mut()
            .for_each(|g| g.exact_in_row = false);
    }

    fn emit_nested_row(&mut self, sheet: SheetRank, row: u32, cursors: &mut CursorTable) {
        let matched: Vec<u16> = self
            .columns
            .iter()
            .filter(|(_, g)| g.exact_in_row)
            .map(|(col, _)| *col)
            .collect();

        if matched.is_empty() {
            let values = self.compose(Some(self.row.slots.as_slice()), None);
            let origin = self.origin(sheet, Some(row), None);
            self.emit(values, origin, cursors);
            return;
        }

        for col in matched {
            let values = self.compose(
                Some(self.row.slots.as_slice()),
                self.columns.get(&col).map(|g| g.slots.as_slice()),
            );
            let origin = self.origin(sheet, Some(row), Some(col));
            self.consume_column(col);
            // Row metrics go to the row's first record only
            consume_metrics(&mut self.row.slots, &self.metric);
            self.emit(values, origin, cursors);
        }
    }

    fn close_sheet(&mut self, cursors: &mut CursorTable) {
        let Some(sheet) = self.sheet.take() else {
            return;
        };

        if self.grouping == Grouping::Columns {
            let matched: Vec<u16> = self
                .columns
                .iter()
                .filter(|(_, g)| g.exact)
                .map(|(col, _)| *col)
                .collect();
            for col in matched {
                let values = self.compose(None, self.columns.get(&col).map(|g| g.slots.as_slice()));
                let origin = self.origin(sheet, None, Some(col));
                self.emit(values, origin, cursors);
            }
        }

        self.columns.clear();
    }

    fn compose(&self, row: Option<&[Slot]>, column: Option<&[Slot]>) -> Vec<Option<CellValue>> {
        self.roles
            .iter()
            .enumerate()
            .map(|(i, role)| match role {
                Role::Document => self.document[i].value().cloned(),
                Role::Row => row.and_then(|slots| slots[i].value()).cloned(),
                Role::Column => column.and_then(|slots| slots[i].value()).cloned(),
                Role::Inactive => None,
            })
            .collect()
    }

    /// Drop metric values of a column group once they are emitted
    fn consume_column(&mut self, col: u16) {
        if let Some(group) = self.columns.get_mut(&col) {
            consume_metrics(&mut group.slots, &self.metric);
        }
    }

    fn emit(&mut self, values: Vec<Option<CellValue>>, origin: RecordOrigin, cursors: &mut CursorTable) {
        for (i, value) in values.iter().enumerate() {
            if value.is_none() {
                continue;
            }
            cursors.mark_used(FieldId(i));
            if self.roles[i] == Role::Document && self.metric[i] {
                self.document[i] = Slot::Empty;
            }
        }
        tracing::trace!(
            "Emitting record at {:?} row {:?} col {:?}",
            origin.sheet,
            origin.row,
            origin.col
        );
        self.pending
            .push_back(Record::new(self.schema.clone(), values, origin));
    }

    fn origin(&self, sheet: SheetRank, row: Option<u32>, col: Option<u16>) -> RecordOrigin {
        RecordOrigin {
            sheet: sheet
                .index()
                .and_then(|i| self.sheet_names.get(i))
                .cloned(),
            row,
            col,
        }
    }
}

fn consume_metrics(slots: &mut [Slot], metric: &[bool]) {
    for (slot, metric) in slots.iter_mut().zip(metric) {
        if *metric {
            *slot = Slot::Empty;
        }
    }
}
