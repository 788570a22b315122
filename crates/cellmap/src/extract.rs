//! The extraction driver
//!
//! An [`Extractor`] holds the classified field configuration and can be
//! shared between threads. Every call to [`Extractor::extract`] builds its own
//! scan state and returns a lazy [`Records`] iterator over one grid.

use cellmap_core::CellValue;

use crate::assemble::{Assembler, Grouping};
use crate::config::{ExtractConfig, ExtractOptions, FieldConfig};
use crate::cursor::{resolve, resolve_constant, CursorTable};
use crate::error::{ExtractError, ExtractResult, FieldIssue};
use crate::field::{duplicate_names, Field, FieldSpec};
use crate::grid::{Grid, ScanGrid, VisitedCell};
use crate::index::{index_fields, IndexedField, Plan};
use crate::record::Record;
use crate::scan_order::{ScanKey, ScanOrder, SheetRank};

/// Outcome of checking a field configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldReport {
    /// Fields without any addressing, always absent from records
    pub void: Vec<String>,
    pub misconfigured: Vec<FieldIssue>,
}

impl FieldReport {
    /// No field is misconfigured. Void fields are allowed.
    pub fn is_clean(&self) -> bool {
        self.misconfigured.is_empty()
    }
}

/// Number of values a field should produce on one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedCount {
    pub field: String,
    pub sheet: String,
    pub count: usize,
}

/// Extracts records from grids
///
/// # Example
///
/// ```
/// use cellmap::{CellValue, Extractor, FieldConfig, Workbook};
///
/// let mut workbook = Workbook::new();
/// let sheet = workbook.worksheet_mut(0).unwrap();
/// sheet.set_cell_value("A1", "item").unwrap();
/// sheet.set_cell_value("A2", "bolt").unwrap();
/// sheet.set_cell_value("A3", "nut").unwrap();
///
/// let extractor = Extractor::new([FieldConfig::new("item").col(0).first_row(1)]);
/// let items: Vec<_> = extractor
///     .extract(&workbook)
///     .unwrap()
///     .map(|r| r.get("item").cloned())
///     .collect();
///
/// assert_eq!(items, vec![Some(CellValue::string("bolt")), Some(CellValue::string("nut"))]);
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    fields: Vec<Field>,
    options: ExtractOptions,
}

impl Extractor {
    pub fn new<I: IntoIterator<Item = FieldConfig>>(fields: I) -> Self {
        Self {
            fields: fields.into_iter().map(Field::new).collect(),
            options: ExtractOptions::default(),
        }
    }

    pub fn from_config(config: ExtractConfig) -> Self {
        Self::new(config.fields).with_options(config.options)
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Classify every field without touching a grid
    pub fn report(&self) -> FieldReport {
        let mut report = FieldReport::default();
        for field in &self.fields {
            match field.spec() {
                Ok(FieldSpec::Void) => report.void.push(field.name().to_string()),
                Ok(_) => {}
                Err(issue) => report.misconfigured.push(issue),
            }
        }
        report.misconfigured.extend(duplicate_names(&self.fields));
        report
    }

    /// Sheet order a scan of `grid` would follow
    pub fn scan_order<G: Grid + ?Sized>(&self, grid: &G) -> ExtractResult<ScanOrder> {
        match &self.options.sheet_order {
            Some(sheets) => ScanOrder::with_sheets(grid, sheets),
            None => Ok(ScanOrder::from_grid(grid)),
        }
    }

    /// Start extracting records from `grid`
    ///
    /// Fails before scanning when a field is misconfigured. Records are
    /// assembled lazily as the returned iterator is advanced.
    pub fn extract<'g, G: Grid + ?Sized>(&self, grid: &'g G) -> ExtractResult<Records<'g, G>> {
        let (order, fields) = self.prepare(grid)?;
        Ok(Records::new(grid, order, fields, self.options.record_limit))
    }

    /// Per field and sheet, how many values the field should produce
    pub fn expected_counts<G: Grid + ?Sized>(&self, grid: &G) -> ExtractResult<Vec<ExpectedCount>> {
        let (order, fields) = self.prepare(grid)?;
        let mut counts = Vec::with_capacity(fields.len() * order.len());
        for field in &fields {
            for sheet in order.sheets() {
                counts.push(ExpectedCount {
                    field: field.name().to_string(),
                    sheet: sheet.clone(),
                    count: field.expected_count(grid, &order, sheet),
                });
            }
        }
        Ok(counts)
    }

    fn prepare<G: Grid + ?Sized>(&self, grid: &G) -> ExtractResult<(ScanOrder, Vec<IndexedField>)> {
        let report = self.report();
        if !report.is_clean() {
            for issue in &report.misconfigured {
                tracing::warn!("Misconfigured {issue}");
            }
            return Err(ExtractError::Misconfigured(report.misconfigured));
        }
        for name in &report.void {
            tracing::warn!("Field '{name}' has no addressing and will always be absent");
        }

        let order = self.scan_order(grid)?;
        let fields = index_fields(&self.fields, &order)?;
        tracing::debug!(
            "Prepared {} field(s) over {} sheet(s)",
            fields.len(),
            order.len()
        );
        Ok((order, fields))
    }
}

/// Populated cells of every scanned sheet, in scan order
struct CellStream<'g> {
    sheets: Vec<(SheetRank, String)>,
    next_sheet: usize,
    current: Option<(SheetRank, Box<dyn Iterator<Item = (u32, u16, &'g CellValue)> + 'g>)>,
}

impl<'g> CellStream<'g> {
    fn new(order: &ScanOrder) -> Self {
        Self {
            sheets: order
                .sheets()
                .iter()
                .map(|name| (order.rank(name), name.clone()))
                .collect(),
            next_sheet: 0,
            current: None,
        }
    }

    fn next<G: Grid + ?Sized>(&mut self, grid: &'g G) -> Option<VisitedCell<'g>> {
        loop {
            if let Some((rank, cells)) = self.current.as_mut() {
                if let Some((row, col, value)) = cells.next() {
                    return Some(VisitedCell::new(ScanKey::new(*rank, row, col), value));
                }
                self.current = None;
            }

            let (rank, name) = self.sheets.get(self.next_sheet)?;
            self.next_sheet += 1;
            tracing::debug!("Scanning sheet '{name}'");
            self.current = Some((*rank, grid.cells(name)));
        }
    }
}

/// Lazily assembled records of one grid
///
/// Created by [`Extractor::extract`].
pub struct Records<'g, G: Grid + ?Sized> {
    grid: &'g G,
    order: ScanOrder,
    fields: Vec<IndexedField>,
    cursors: CursorTable,
    stream: CellStream<'g>,
    assembler: Assembler,
    remaining: Option<usize>,
    finished: bool,
}

impl<'g, G: Grid + ?Sized> Records<'g, G> {
    fn new(grid: &'g G, order: ScanOrder, fields: Vec<IndexedField>, limit: Option<usize>) -> Self {
        let assembler = Assembler::new(&fields, order.sheets().to_vec());
        Self {
            grid,
            stream: CellStream::new(&order),
            cursors: CursorTable::new(fields.len()),
            order,
            fields,
            assembler,
            remaining: limit,
            finished: false,
        }
    }

    /// How records are delimited for this field set
    pub fn grouping(&self) -> Grouping {
        self.assembler.grouping()
    }

    pub fn scan_order(&self) -> &ScanOrder {
        &self.order
    }

    fn visit(&mut self, cell: VisitedCell<'g>) {
        let grid = ScanGrid::new(self.grid, &self.order);
        self.assembler.enter(cell.key, &mut self.cursors);
        for field in &self.fields {
            if field.is_void() {
                continue;
            }
            let resolution = resolve(field, self.cursors.get_mut(field.id()), &cell, &grid);
            self.assembler
                .observe(field.id(), cell.key, resolution, &mut self.cursors);
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.assembler.close(&mut self.cursors);

        if self.assembler.grouping() == Grouping::Document {
            // Constants are read even when no cell was visited
            let grid = ScanGrid::new(self.grid, &self.order);
            let anywhere = ScanKey::new(SheetRank::UNREACHABLE, 0, 0);
            for field in &self.fields {
                if let Plan::Constant(source) = field.plan() {
                    let resolution =
                        resolve_constant(field, source, self.cursors.get_mut(field.id()), &grid);
                    self.assembler
                        .observe(field.id(), anywhere, resolution, &mut self.cursors);
                }
            }
            self.assembler.emit_document(&mut self.cursors);
        }
        tracing::debug!("Scan finished");
    }
}

impl<'g, G: Grid + ?Sized> Iterator for Records<'g, G> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            if let Some(record) = self.assembler.pop() {
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                return Some(record);
            }
            if self.finished {
                return None;
            }
            match self.stream.next(self.grid) {
                Some(cell) => self.visit(cell),
                None => self.finish(),
            }
        }
    }
}
