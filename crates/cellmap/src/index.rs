//! Mapping classified fields onto one scan order
//!
//! Indexing resolves sheet references to ranks, sorts list-addressed fields
//! into scan order so they can be binary searched, and records the axis each
//! field varies along.

use cellmap_core::CellValue;

use crate::config::SheetRef;
use crate::error::{ExtractError, ExtractResult, FieldIssue};
use crate::field::{Field, FieldCell, FieldSpec};
use crate::grid::Grid;
use crate::scan_order::{ScanKey, ScanOrder, SheetRank};

/// Position of a field in its extractor, used to index cursor tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub usize);

/// Where a constant's value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantSource {
    /// Read once from the grid
    Cell(ScanKey),
    /// Already extracted
    Value(CellValue),
}

/// One entry of a list-addressed field
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: ScanKey,
    /// Pre-extracted value, `None` to read the grid at `key`
    pub value: Option<CellValue>,
}

/// A field's addressing, resolved against a scan order
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Constant(ConstantSource),
    /// `sheet: None` matches every sheet
    ColumnScan {
        sheet: Option<SheetRank>,
        col: u16,
        first_row: u32,
    },
    RowScan {
        sheet: Option<SheetRank>,
        row: u32,
    },
    /// Sorted by key, no repeated keys
    List(Vec<ListEntry>),
    Void,
}

/// The direction along which a field produces new values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Same value everywhere
    Fixed,
    /// A new value per row
    Rows,
    /// A new value per column
    Columns,
    /// Contributes nothing
    Unset,
}

/// A field ready for resolution
#[derive(Debug, Clone)]
pub struct IndexedField {
    id: FieldId,
    name: String,
    is_metric: bool,
    depth: Option<u32>,
    plan: Plan,
    axis: Axis,
}

impl IndexedField {
    /// Index one classified field
    pub fn index(id: FieldId, field: &Field, order: &ScanOrder) -> Result<Self, FieldIssue> {
        let spec = field.spec()?;
        let issue = |reason: String| FieldIssue::new(field.name(), reason);

        let plan = match spec {
            FieldSpec::Constant { cell, value } => {
                let key = key_of(cell, order).map_err(issue)?;
                match value {
                    Some(v) => Plan::Constant(ConstantSource::Value(v.clone())),
                    None => Plan::Constant(ConstantSource::Cell(key)),
                }
            }
            FieldSpec::ColumnScan {
                sheet,
                col,
                first_row,
            } => Plan::ColumnScan {
                sheet: scan_sheet(sheet.as_ref(), order).map_err(issue)?,
                col: *col,
                first_row: *first_row,
            },
            FieldSpec::RowScan { sheet, row } => Plan::RowScan {
                sheet: scan_sheet(sheet.as_ref(), order).map_err(issue)?,
                row: *row,
            },
            FieldSpec::CellList(cells) => {
                let mut entries = Vec::with_capacity(cells.len());
                for cell in cells {
                    entries.push(ListEntry {
                        key: key_of(cell, order).map_err(issue)?,
                        value: None,
                    });
                }
                Plan::List(sort_entries(field.name(), entries))
            }
            FieldSpec::ValueList(values) => {
                let mut entries = Vec::with_capacity(values.len());
                for (cell, value) in values {
                    entries.push(ListEntry {
                        key: key_of(cell, order).map_err(issue)?,
                        value: Some(value.clone()),
                    });
                }
                Plan::List(sort_entries(field.name(), entries))
            }
            FieldSpec::Void => Plan::Void,
        };

        let axis = axis_of(&plan);
        tracing::debug!("Indexed field '{}' with axis {:?}", field.name(), axis);

        Ok(Self {
            id,
            name: field.name().to_string(),
            is_metric: field.is_metric(),
            depth: field.config().depth,
            plan,
            axis,
        })
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_metric(&self) -> bool {
        self.is_metric
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn is_void(&self) -> bool {
        matches!(self.plan, Plan::Void)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.plan, Plan::Constant(_))
    }

    /// Nesting depth used for grouping when row and column fields are mixed
    ///
    /// Defaults to 0 for fields varying by row and 1 for fields varying by
    /// column.
    pub fn depth(&self) -> u32 {
        self.depth.unwrap_or(match self.axis {
            Axis::Columns => 1,
            _ => 0,
        })
    }

    /// How many values this field should produce on `sheet`
    ///
    /// Sheets outside the scan order produce nothing.
    pub fn expected_count<G: Grid + ?Sized>(&self, grid: &G, order: &ScanOrder, sheet: &str) -> usize {
        let rank = order.rank(sheet);
        if !rank.is_reachable() {
            return 0;
        }
        let on_sheet = |field_sheet: Option<SheetRank>| field_sheet.map_or(true, |s| s == rank);

        match &self.plan {
            Plan::Constant(_) => 1,
            Plan::List(entries) => entries.iter().filter(|e| e.key.sheet == rank).count(),
            Plan::ColumnScan {
                sheet: field_sheet,
                first_row,
                ..
            } => {
                if !on_sheet(*field_sheet) {
                    return 0;
                }
                match grid.last_row(sheet) {
                    Some(last) if last >= *first_row => (last - first_row) as usize + 1,
                    _ => 0,
                }
            }
            Plan::RowScan {
                sheet: field_sheet,
                row,
            } => {
                if !on_sheet(*field_sheet) {
                    return 0;
                }
                grid.last_col_in_row(sheet, *row)
                    .map_or(0, |col| col as usize)
            }
            Plan::Void => 0,
        }
    }
}

/// Index every field, reporting all issues together
pub fn index_fields(fields: &[Field], order: &ScanOrder) -> ExtractResult<Vec<IndexedField>> {
    let mut indexed = Vec::with_capacity(fields.len());
    let mut issues = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        match IndexedField::index(FieldId(i), field, order) {
            Ok(f) => indexed.push(f),
            Err(issue) => issues.push(issue),
        }
    }
    if issues.is_empty() {
        Ok(indexed)
    } else {
        for issue in &issues {
            tracing::warn!("Misconfigured {issue}");
        }
        Err(ExtractError::Misconfigured(issues))
    }
}

fn resolve_sheet(sheet: &SheetRef, order: &ScanOrder) -> Result<SheetRank, String> {
    match sheet {
        SheetRef::Name(name) => {
            let rank = order.rank(name);
            if !rank.is_reachable() {
                tracing::warn!("Sheet '{name}' is not scanned, its cells are unreachable");
            }
            Ok(rank)
        }
        SheetRef::Index(i) => order
            .sheets()
            .get(*i)
            .map(|name| order.rank(name))
            .ok_or_else(|| {
                format!(
                    "sheet index {} is out of range ({} sheets scanned)",
                    i,
                    order.len()
                )
            }),
    }
}

fn scan_sheet(sheet: Option<&SheetRef>, order: &ScanOrder) -> Result<Option<SheetRank>, String> {
    sheet.map(|s| resolve_sheet(s, order)).transpose()
}

fn key_of(cell: &FieldCell, order: &ScanOrder) -> Result<ScanKey, String> {
    let sheet = match &cell.sheet {
        Some(sheet) => resolve_sheet(sheet, order)?,
        None if order.is_empty() => SheetRank::UNREACHABLE,
        None => SheetRank::new(0),
    };
    Ok(ScanKey::new(sheet, cell.row, cell.col))
}

fn sort_entries(name: &str, mut entries: Vec<ListEntry>) -> Vec<ListEntry> {
    // Stable, so the first listing of a repeated cell is the one kept
    entries.sort_by_key(|e| e.key);
    let before = entries.len();
    entries.dedup_by_key(|e| e.key);
    if entries.len() != before {
        tracing::debug!(
            "Field '{name}' lists {} cell(s) more than once",
            before - entries.len()
        );
    }
    entries
}

fn axis_of(plan: &Plan) -> Axis {
    match plan {
        Plan::Constant(_) => Axis::Fixed,
        Plan::ColumnScan { .. } => Axis::Rows,
        Plan::RowScan { .. } => Axis::Columns,
        Plan::List(entries) => {
            let spans_rows = entries
                .windows(2)
                .any(|w| (w[0].key.sheet, w[0].key.row) != (w[1].key.sheet, w[1].key.row));
            if spans_rows {
                Axis::Rows
            } else {
                Axis::Columns
            }
        }
        Plan::Void => Axis::Unset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CellRef, FieldConfig, RangeRef};
    use cellmap_core::{Workbook, Worksheet};
    use pretty_assertions::assert_eq;

    fn index(config: FieldConfig, order: &ScanOrder) -> Result<IndexedField, FieldIssue> {
        IndexedField::index(FieldId(0), &Field::new(config), order)
    }

    #[test]
    fn test_lists_sort_into_scan_order() {
        let order = ScanOrder::new(["B", "A"]);
        let field = index(
            FieldConfig::new("f")
                .cell(CellRef::on("A", 0, 0))
                .cell(CellRef::on("B", 5, 1))
                .cell(CellRef::on("Gone", 0, 0))
                .cell(CellRef::on("B", 5, 0))
                .cell(CellRef::on("B", 5, 0)),
            &order,
        )
        .unwrap();

        let Plan::List(entries) = field.plan() else {
            panic!("expected a list plan");
        };
        let keys: Vec<_> = entries.iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec![
                ScanKey::new(SheetRank::new(0), 5, 0),
                ScanKey::new(SheetRank::new(0), 5, 1),
                ScanKey::new(SheetRank::new(1), 0, 0),
                ScanKey::new(SheetRank::UNREACHABLE, 0, 0),
            ]
        );
        assert_eq!(field.axis(), Axis::Rows);
    }

    #[test]
    fn test_axis_and_depth() {
        let order = ScanOrder::new(["S"]);

        let header = index(
            FieldConfig::new("h").range(RangeRef::parse("S!B1:D1").unwrap()),
            &order,
        )
        .unwrap();
        assert_eq!(header.axis(), Axis::Columns);
        assert_eq!(header.depth(), 1);

        let scan = index(FieldConfig::new("c").col(0), &order).unwrap();
        assert_eq!(scan.axis(), Axis::Rows);
        assert_eq!(scan.depth(), 0);

        let deep = index(FieldConfig::new("r").row(0).depth(4), &order).unwrap();
        assert_eq!(deep.axis(), Axis::Columns);
        assert_eq!(deep.depth(), 4);

        let constant = index(FieldConfig::new("k").row(0).col(0), &order).unwrap();
        assert_eq!(constant.axis(), Axis::Fixed);
        assert_eq!(
            constant.plan(),
            &Plan::Constant(ConstantSource::Cell(ScanKey::new(SheetRank::new(0), 0, 0)))
        );
    }

    #[test]
    fn test_sheet_index_resolution() {
        let order = ScanOrder::new(["First", "Second"]);
        let field = index(FieldConfig::new("c").sheet(1usize).col(2), &order).unwrap();
        assert_eq!(
            field.plan(),
            &Plan::ColumnScan {
                sheet: Some(SheetRank::new(1)),
                col: 2,
                first_row: 0,
            }
        );

        let err = index(FieldConfig::new("bad").sheet(2usize).col(2), &order).unwrap_err();
        assert_eq!(err.field, "bad");
    }

    #[test]
    fn test_index_fields_collects_all_issues() {
        let order = ScanOrder::new(["S"]);
        let fields = vec![
            Field::new(FieldConfig::new("ok").col(0)),
            Field::new(FieldConfig::new("a").sheet(3usize).col(0)),
            Field::new(FieldConfig::new("b").row(1).first_row(2)),
        ];
        match index_fields(&fields, &order) {
            Err(ExtractError::Misconfigured(issues)) => {
                let names: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_expected_count() {
        let mut wb = Workbook::empty();
        let mut s = Worksheet::new("S");
        for row in 0..5 {
            s.set_cell_value_at(row, 2, row as f64).unwrap();
        }
        s.set_cell_value_at(0, 4, "last").unwrap();
        wb.add_existing_worksheet(s).unwrap();
        wb.add_worksheet_with_name("T").unwrap();
        let order = ScanOrder::from_grid(&wb);

        let column = index(FieldConfig::new("c").col(2).first_row(1), &order).unwrap();
        assert_eq!(column.expected_count(&wb, &order, "S"), 4);
        assert_eq!(column.expected_count(&wb, &order, "T"), 0);

        let row = index(FieldConfig::new("r").sheet("S").row(0), &order).unwrap();
        assert_eq!(row.expected_count(&wb, &order, "S"), 4);
        assert_eq!(row.expected_count(&wb, &order, "T"), 0);

        let list = index(
            FieldConfig::new("l")
                .cell(CellRef::on("S", 0, 0))
                .cell(CellRef::on("S", 1, 0))
                .cell(CellRef::on("T", 0, 0)),
            &order,
        )
        .unwrap();
        assert_eq!(list.expected_count(&wb, &order, "S"), 2);
        assert_eq!(list.expected_count(&wb, &order, "T"), 1);

        let constant = index(FieldConfig::new("k").row(0).col(0), &order).unwrap();
        assert_eq!(constant.expected_count(&wb, &order, "T"), 1);

        let void = index(FieldConfig::new("v"), &order).unwrap();
        assert_eq!(void.expected_count(&wb, &order, "S"), 0);
    }

    #[test]
    fn test_expected_count_outside_scan_order() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("S").unwrap();
        wb.add_worksheet_with_name("T").unwrap();
        let order = ScanOrder::new(["S"]);

        let list = index(
            FieldConfig::new("l")
                .cell(CellRef::on("T", 0, 0))
                .cell(CellRef::on("Nope", 1, 0)),
            &order,
        )
        .unwrap();
        assert_eq!(list.expected_count(&wb, &order, "S"), 0);
        assert_eq!(list.expected_count(&wb, &order, "T"), 0);
        assert_eq!(list.expected_count(&wb, &order, "Nope"), 0);

        let constant = index(FieldConfig::new("k").row(0).col(0), &order).unwrap();
        assert_eq!(constant.expected_count(&wb, &order, "T"), 0);
    }
}
