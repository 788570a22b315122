//! End-to-end extraction over in-memory workbooks

use std::cell::Cell;
use std::collections::BTreeMap;

use cellmap::config::{CellRef, RangeRef};
use cellmap::cursor::{resolve, Cursor, CursorTable, Resolution};
use cellmap::field::Field;
use cellmap::grid::{ScanGrid, VisitedCell};
use cellmap::index::{FieldId, IndexedField};
use cellmap::prelude::*;
use cellmap::scan_order::{ScanKey, ScanOrder};
use cellmap::Grouping;
use pretty_assertions::assert_eq;

fn sheet(name: &str, cells: &[(u32, u16, CellValue)]) -> Worksheet {
    let mut ws = Worksheet::new(name);
    for (row, col, value) in cells {
        ws.set_cell_value_at(*row, *col, value.clone()).unwrap();
    }
    ws
}

fn workbook(sheets: Vec<Worksheet>) -> Workbook {
    let mut wb = Workbook::empty();
    for ws in sheets {
        wb.add_existing_worksheet(ws).unwrap();
    }
    wb
}

static BLANK: CellValue = CellValue::Empty;

fn visit<'a>(wb: &'a Workbook, order: &ScanOrder, sheet: &str, row: u32, col: u16) -> VisitedCell<'a> {
    let value = Grid::value(wb, sheet, row, col).unwrap_or(&BLANK);
    VisitedCell::new(ScanKey::new(order.rank(sheet), row, col), value)
}

fn text(records: &[Record], field: &str) -> Vec<Option<String>> {
    records
        .iter()
        .map(|r| r.get(field).map(|v| v.to_string()))
        .collect()
}

#[test]
fn column_scan_matches_rows_from_first_row() {
    let wb = workbook(vec![sheet(
        "S",
        &[
            (0, 2, "X".into()),
            (1, 2, 10.0.into()),
            (2, 2, 20.0.into()),
            (3, 2, 30.0.into()),
            (4, 2, 40.0.into()),
        ],
    )]);
    let order = ScanOrder::from_grid(&wb);
    let grid = ScanGrid::new(&wb, &order);
    let field = IndexedField::index(
        FieldId(0),
        &Field::new(FieldConfig::new("X").sheet("S").col(2).first_row(1)),
        &order,
    )
    .unwrap();
    let mut cursor = Cursor::new();

    assert_eq!(
        resolve(&field, &mut cursor, &visit(&wb, &order, "S", 0, 2), &grid),
        Resolution::none()
    );
    let seen: Vec<_> = (1..=4)
        .map(|row| resolve(&field, &mut cursor, &visit(&wb, &order, "S", row, 2), &grid))
        .collect();
    assert_eq!(
        seen,
        vec![
            Resolution::exact(10.0.into()),
            Resolution::exact(20.0.into()),
            Resolution::exact(30.0.into()),
            Resolution::exact(40.0.into()),
        ]
    );
}

#[test]
fn metric_cell_list_is_consumed_once() {
    let wb = workbook(vec![sheet(
        "S",
        &[(2, 0, "A".into()), (3, 0, "filler".into()), (5, 0, "B".into())],
    )]);
    let order = ScanOrder::from_grid(&wb);
    let grid = ScanGrid::new(&wb, &order);
    let field = IndexedField::index(
        FieldId(0),
        &Field::new(
            FieldConfig::new("Y")
                .cell(CellRef::on("S", 2, 0))
                .cell(CellRef::on("S", 5, 0))
                .metric(true),
        ),
        &order,
    )
    .unwrap();

    // Not yet used: the nearest preceding entry is offered as nearby
    let mut fresh = Cursor::new();
    resolve(&field, &mut fresh, &visit(&wb, &order, "S", 2, 0), &grid);
    assert_eq!(
        resolve(&field, &mut fresh, &visit(&wb, &order, "S", 3, 0), &grid),
        Resolution::nearby("A".into())
    );

    let mut cursors = CursorTable::new(1);
    let id = FieldId(0);
    assert_eq!(
        resolve(&field, cursors.get_mut(id), &visit(&wb, &order, "S", 2, 0), &grid),
        Resolution::exact("A".into())
    );
    cursors.mark_used(id);
    assert!(resolve(&field, cursors.get_mut(id), &visit(&wb, &order, "S", 2, 0), &grid).is_none());
    assert!(resolve(&field, cursors.get_mut(id), &visit(&wb, &order, "S", 3, 0), &grid).is_none());
    assert_eq!(
        resolve(&field, cursors.get_mut(id), &visit(&wb, &order, "S", 5, 0), &grid),
        Resolution::exact("B".into())
    );
}

#[test]
fn constant_resolves_everywhere() {
    let mut cells = vec![(0, 0, CellValue::string("123456"))];
    cells.extend((0..10).map(|col| (1, col, CellValue::Number(col as f64))));
    let wb = workbook(vec![sheet("S", &cells)]);
    let order = ScanOrder::from_grid(&wb);
    let grid = ScanGrid::new(&wb, &order);
    let field = IndexedField::index(
        FieldId(0),
        &Field::new(FieldConfig::new("Z").sheet("S").row(0).col(0)),
        &order,
    )
    .unwrap();
    let mut cursor = Cursor::new();

    for col in 0..10 {
        assert_eq!(
            resolve(&field, &mut cursor, &visit(&wb, &order, "S", 1, col), &grid),
            Resolution::exact("123456".into())
        );
    }
}

#[test]
fn void_field_is_always_absent() {
    let void = Field::new(FieldConfig::new("V"));
    assert!(void.is_void());

    let wb = workbook(vec![sheet("S", &[(0, 0, "a".into()), (1, 0, "b".into())])]);
    let extractor = Extractor::new([FieldConfig::new("letter").col(0), FieldConfig::new("V")]);
    assert_eq!(extractor.report().void, vec!["V".to_string()]);

    let records: Vec<_> = extractor.extract(&wb).unwrap().collect();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(record.contains_field("V"));
        assert_eq!(record.get("V"), None);
    }
}

#[test]
fn nested_grouping_unpivots_a_cross_table() {
    let wb = workbook(vec![sheet(
        "Sales",
        &[
            (0, 0, "product".into()),
            (0, 1, "Jan".into()),
            (0, 2, "Feb".into()),
            (1, 0, "bolt".into()),
            (1, 1, 4.0.into()),
            (1, 2, 5.0.into()),
            (2, 0, "nut".into()),
            (2, 1, 7.0.into()),
        ],
    )]);
    let extractor = Extractor::new([
        FieldConfig::new("product").col(0).first_row(1),
        FieldConfig::new("month").range(RangeRef::parse("B1:C1").unwrap()),
        FieldConfig::new("qty")
            .range(RangeRef::parse("B2:C3").unwrap())
            .value_type(ValueType::Number)
            .depth(1),
    ]);

    let records = extractor.extract(&wb).unwrap();
    assert_eq!(records.grouping(), Grouping::Nested);
    let records: Vec<_> = records.collect();

    assert_eq!(
        text(&records, "product"),
        vec![Some("bolt".into()), Some("bolt".into()), Some("nut".into())]
    );
    assert_eq!(
        text(&records, "month"),
        vec![Some("Jan".into()), Some("Feb".into()), Some("Jan".into())]
    );
    assert_eq!(
        text(&records, "qty"),
        vec![Some("4".into()), Some("5".into()), Some("7".into())]
    );
    assert_eq!(
        records[1].origin(),
        &RecordOrigin {
            sheet: Some("Sales".into()),
            row: Some(1),
            col: Some(2),
        }
    );
}

#[test]
fn header_row_fields_emit_one_record_per_column() {
    let wb = workbook(vec![sheet(
        "Totals",
        &[
            (0, 0, "quarter".into()),
            (0, 1, "Q1".into()),
            (0, 2, "Q2".into()),
            (1, 0, "revenue".into()),
            (1, 1, 100.0.into()),
            (1, 2, 120.0.into()),
        ],
    )]);
    let extractor = Extractor::new([
        FieldConfig::new("quarter").row(0),
        FieldConfig::new("revenue").row(1).value_type(ValueType::Number),
    ]);

    let records = extractor.extract(&wb).unwrap();
    assert_eq!(records.grouping(), Grouping::Columns);
    let records: Vec<_> = records.collect();

    assert_eq!(text(&records, "quarter"), vec![Some("Q1".into()), Some("Q2".into())]);
    assert_eq!(text(&records, "revenue"), vec![Some("100".into()), Some("120".into())]);
    assert_eq!(records[0].origin().col, Some(1));
    assert_eq!(records[0].origin().row, None);
}

/// How many records each distinct value of `field` appears in
fn reach(records: &[Record], field: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in text(records, field).into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

#[test]
fn row_totals_of_a_cross_table_reach_one_record() {
    let wb = workbook(vec![sheet(
        "Sales",
        &[
            (0, 0, "product".into()),
            (0, 1, "Jan".into()),
            (0, 2, "Feb".into()),
            (0, 3, "total".into()),
            (1, 0, "bolt".into()),
            (1, 1, 4.0.into()),
            (1, 2, 5.0.into()),
            (1, 3, 9.0.into()),
            (2, 0, "nut".into()),
            (2, 1, 7.0.into()),
            (2, 2, 8.0.into()),
            (2, 3, 15.0.into()),
        ],
    )]);
    let extractor = Extractor::new([
        FieldConfig::new("product").col(0).first_row(1),
        FieldConfig::new("row_total")
            .col(3)
            .first_row(1)
            .value_type(ValueType::Number),
        FieldConfig::new("month").range(RangeRef::parse("B1:C1").unwrap()),
        FieldConfig::new("qty")
            .range(RangeRef::parse("B2:C3").unwrap())
            .value_type(ValueType::Number)
            .depth(1),
    ]);

    let records = extractor.extract(&wb).unwrap();
    assert_eq!(records.grouping(), Grouping::Nested);
    let records: Vec<_> = records.collect();

    assert_eq!(
        text(&records, "qty"),
        vec![Some("4".into()), Some("5".into()), Some("7".into()), Some("8".into())]
    );
    assert_eq!(
        text(&records, "row_total"),
        vec![Some("9".into()), None, Some("15".into()), None]
    );
    assert_eq!(
        text(&records, "product"),
        vec![Some("bolt".into()), Some("bolt".into()), Some("nut".into()), Some("nut".into())]
    );
    for field in ["row_total", "qty"] {
        assert!(reach(&records, field).values().all(|&n| n == 1), "{field}");
    }
}

#[test]
fn sparse_metric_list_does_not_spill_into_next_column() {
    let wb = workbook(vec![sheet(
        "T",
        &[
            (0, 0, "quarter".into()),
            (0, 1, "Q1".into()),
            (0, 2, "Q2".into()),
            (0, 3, "Q3".into()),
            (1, 0, "adj".into()),
            (1, 1, 7.0.into()),
            (1, 2, 8.0.into()),
            (1, 3, 9.0.into()),
        ],
    )]);
    let extractor = Extractor::new([
        FieldConfig::new("quarter").row(0),
        FieldConfig::new("adj")
            .cells([CellRef::on("T", 1, 1), CellRef::on("T", 1, 3)])
            .value_type(ValueType::Number),
    ]);

    let records = extractor.extract(&wb).unwrap();
    assert_eq!(records.grouping(), Grouping::Columns);
    let records: Vec<_> = records.collect();

    assert_eq!(
        text(&records, "quarter"),
        vec![Some("Q1".into()), Some("Q2".into()), Some("Q3".into())]
    );
    assert_eq!(text(&records, "adj"), vec![Some("7".into()), None, Some("9".into())]);
    assert!(reach(&records, "adj").values().all(|&n| n == 1));
}

fn monthly_sheets() -> Workbook {
    workbook(vec![
        sheet("Jan", &[(0, 0, "January".into()), (0, 1, 100.0.into())]),
        sheet("Feb", &[(0, 0, "February".into()), (0, 1, 80.0.into())]),
    ])
}

fn monthly_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::new("month")
            .cell(CellRef::on("Jan", 0, 0))
            .cell(CellRef::on("Feb", 0, 0)),
        FieldConfig::new("total")
            .cells([CellRef::on("Feb", 0, 1), CellRef::on("Jan", 0, 1)])
            .value_type(ValueType::Number),
    ]
}

#[test]
fn lists_spanning_sheets_follow_scan_order() {
    let wb = monthly_sheets();
    let records: Vec<_> = Extractor::new(monthly_fields())
        .extract(&wb)
        .unwrap()
        .collect();

    assert_eq!(text(&records, "month"), vec![Some("January".into()), Some("February".into())]);
    assert_eq!(text(&records, "total"), vec![Some("100".into()), Some("80".into())]);
    assert_eq!(records[1].origin().sheet.as_deref(), Some("Feb"));
}

#[test]
fn explicit_sheet_order() {
    let wb = monthly_sheets();

    let reversed = Extractor::new(monthly_fields())
        .with_options(ExtractOptions::default().with_sheet_order(["Feb", "Jan"]));
    let records: Vec<_> = reversed.extract(&wb).unwrap().collect();
    assert_eq!(text(&records, "month"), vec![Some("February".into()), Some("January".into())]);

    let only_feb = Extractor::new(monthly_fields())
        .with_options(ExtractOptions::default().with_sheet_order(["Feb"]));
    let records: Vec<_> = only_feb.extract(&wb).unwrap().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("total"), Some(&CellValue::Number(80.0)));

    let unknown = Extractor::new(monthly_fields())
        .with_options(ExtractOptions::default().with_sheet_order(["Mar"]));
    assert!(matches!(
        unknown.extract(&wb),
        Err(ExtractError::UnknownSheet(name)) if name == "Mar"
    ));
}

#[test]
fn record_limit_stops_the_scan() {
    let rows: Vec<_> = (0..50)
        .map(|row| (row, 0, CellValue::Number(row as f64)))
        .collect();
    let wb = workbook(vec![sheet("S", &rows)]);
    let extractor = Extractor::new([FieldConfig::new("n").col(0).value_type(ValueType::Number)])
        .with_options(ExtractOptions::default().with_record_limit(3));

    let records: Vec<_> = extractor.extract(&wb).unwrap().collect();
    assert_eq!(text(&records, "n"), vec![Some("0".into()), Some("1".into()), Some("2".into())]);
}

#[test]
fn metric_constant_lands_in_first_record_only() {
    let wb = workbook(vec![sheet(
        "S",
        &[
            (0, 0, "Invoice total".into()),
            (0, 1, 30.0.into()),
            (2, 0, "line a".into()),
            (3, 0, "line b".into()),
        ],
    )]);
    let extractor = Extractor::new([
        FieldConfig::new("total").row(0).col(1).value_type(ValueType::Number),
        FieldConfig::new("line").col(0).first_row(2),
    ]);

    let records: Vec<_> = extractor.extract(&wb).unwrap().collect();
    assert_eq!(text(&records, "line"), vec![Some("line a".into()), Some("line b".into())]);
    assert_eq!(text(&records, "total"), vec![Some("30".into()), None]);
}

/// Counts reads of single cells
struct CountingGrid {
    inner: Workbook,
    reads: Cell<usize>,
}

impl Grid for CountingGrid {
    fn sheet_names(&self) -> Vec<&str> {
        self.inner.sheet_names().collect()
    }

    fn value(&self, sheet: &str, row: u32, col: u16) -> Option<&CellValue> {
        self.reads.set(self.reads.get() + 1);
        Grid::value(&self.inner, sheet, row, col)
    }

    fn cells<'a>(&'a self, sheet: &str) -> Box<dyn Iterator<Item = (u32, u16, &'a CellValue)> + 'a> {
        self.inner.cells(sheet)
    }

    fn last_row(&self, sheet: &str) -> Option<u32> {
        Grid::last_row(&self.inner, sheet)
    }

    fn last_col_in_row(&self, sheet: &str, row: u32) -> Option<u16> {
        Grid::last_col_in_row(&self.inner, sheet, row)
    }
}

#[test]
fn constant_is_read_once_per_scan() {
    let rows: Vec<_> = (1..20)
        .map(|row| (row, 1, CellValue::Number(row as f64)))
        .collect();
    let mut ws = sheet("S", &rows);
    ws.set_cell_value("A1", "batch-7").unwrap();
    let grid = CountingGrid {
        inner: workbook(vec![ws]),
        reads: Cell::new(0),
    };
    let extractor = Extractor::new([
        FieldConfig::new("batch").row(0).col(0),
        FieldConfig::new("n").col(1),
    ]);

    let records: Vec<_> = extractor.extract(&grid).unwrap().collect();
    assert_eq!(records.len(), 19);
    assert!(records
        .iter()
        .all(|r| r.get("batch") == Some(&CellValue::string("batch-7"))));
    assert_eq!(grid.reads.get(), 1);
}

#[test]
fn one_extractor_serves_many_threads() {
    let extractor = Extractor::new([
        FieldConfig::new("name").col(0),
        FieldConfig::new("score").col(1).value_type(ValueType::Number),
    ]);
    let books: Vec<Workbook> = (0..4)
        .map(|i| {
            let rows: Vec<_> = (0..=i)
                .flat_map(|row| {
                    [
                        (row, 0, CellValue::string(format!("p{row}"))),
                        (row, 1, CellValue::Number(f64::from(row))),
                    ]
                })
                .collect();
            workbook(vec![sheet("S", &rows)])
        })
        .collect();

    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = books
            .iter()
            .map(|wb| {
                let extractor = &extractor;
                scope.spawn(move || extractor.extract(wb).unwrap().count())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counts, vec![1, 2, 3, 4]);
}

#[test]
fn json_configuration_end_to_end() {
    let wb = workbook(vec![
        sheet("Header", &[(0, 0, "Taxpayer".into()), (0, 1, "J. Doe".into())]),
        sheet(
            "Data",
            &[
                (0, 2, "amount".into()),
                (1, 2, 12.5.into()),
                (2, 2, 7.5.into()),
            ],
        ),
    ]);
    let config = ExtractConfig::from_json_str(
        r#"{
            "fields": [
                {"name": "taxpayer", "sheet": "Header", "row": 0, "col": 1, "type": "text"},
                {"name": "amount", "sheet": 1, "col": 2, "first_row": 1, "type": "number"}
            ]
        }"#,
    )
    .unwrap();

    let records: Vec<_> = Extractor::from_config(config).extract(&wb).unwrap().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(
        serde_json::to_string(&records[1]).unwrap(),
        r#"{"taxpayer":"J. Doe","amount":7.5}"#
    );
}
