//! Field classification
//!
//! A field's raw configuration is turned into exactly one [`FieldSpec`]
//! addressing mode. Classification runs once per field and is cached, so
//! an [`Extractor`](crate::Extractor) holding classified fields can be
//! shared between threads.

use cellmap_core::{CellAddress, CellValue};
use once_cell::sync::OnceCell;

use crate::config::{CellRef, FieldConfig, SheetRef};
use crate::error::FieldIssue;

/// Largest number of cells a field's ranges may expand to
pub const MAX_LIST_CELLS: u64 = 1 << 20;

/// A cell named by a field, before it is mapped onto a scan order
///
/// `sheet: None` means the first scanned sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldCell {
    pub sheet: Option<SheetRef>,
    pub row: u32,
    pub col: u16,
}

impl FieldCell {
    pub fn new(sheet: Option<SheetRef>, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }

    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }
}

/// How a field finds its values
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// One fixed cell, or one pre-extracted value
    Constant {
        cell: FieldCell,
        value: Option<CellValue>,
    },
    /// Every row of a fixed column from `first_row` down
    ColumnScan {
        sheet: Option<SheetRef>,
        col: u16,
        first_row: u32,
    },
    /// Every column of a fixed row, from column 1 on
    RowScan { sheet: Option<SheetRef>, row: u32 },
    /// Explicit cells, possibly on several sheets
    CellList(Vec<FieldCell>),
    /// Values extracted ahead of time, each tagged with its source cell
    ValueList(Vec<(FieldCell, CellValue)>),
    /// Nothing configured
    Void,
}

impl FieldSpec {
    /// Short name of the addressing mode
    pub fn kind(&self) -> &'static str {
        match self {
            FieldSpec::Constant { .. } => "constant",
            FieldSpec::ColumnScan { .. } => "column scan",
            FieldSpec::RowScan { .. } => "row scan",
            FieldSpec::CellList(_) => "cell list",
            FieldSpec::ValueList(_) => "value list",
            FieldSpec::Void => "void",
        }
    }
}

/// A configured field and its cached classification
#[derive(Debug, Clone)]
pub struct Field {
    config: FieldConfig,
    spec: OnceCell<Result<FieldSpec, FieldIssue>>,
}

impl Field {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            config,
            spec: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn is_metric(&self) -> bool {
        self.config.is_metric()
    }

    /// The field's addressing mode
    ///
    /// Rules, first match wins:
    /// 1. fixed row and column, or a list of exactly one cell: `Constant`
    /// 2. a non-empty cell list: `CellList`
    /// 3. a non-empty value list: `ValueList`
    /// 4. a fixed column: `ColumnScan`
    /// 5. a fixed row: `RowScan`
    /// 6. otherwise `Void`
    ///
    /// Contradictory configurations are reported as a [`FieldIssue`].
    pub fn spec(&self) -> Result<&FieldSpec, FieldIssue> {
        self.spec
            .get_or_init(|| classify(&self.config))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// True when the field is configured with nothing to read
    pub fn is_void(&self) -> bool {
        matches!(self.spec(), Ok(FieldSpec::Void))
    }

    /// True when the field yields one fixed value
    pub fn is_constant(&self) -> bool {
        matches!(self.spec(), Ok(FieldSpec::Constant { .. }))
    }
}

impl From<FieldConfig> for Field {
    fn from(config: FieldConfig) -> Self {
        Self::new(config)
    }
}

fn classify(config: &FieldConfig) -> Result<FieldSpec, FieldIssue> {
    let issue = |reason: String| FieldIssue::new(config.name.clone(), reason);

    let cells = list_cells(config).map_err(issue)?;
    let values: Vec<(FieldCell, CellValue)> = config
        .values
        .iter()
        .map(|entry| (locate(config, &entry.at), entry.value.clone()))
        .collect();

    if !cells.is_empty() && !values.is_empty() {
        return Err(issue(format!(
            "both a cell list ({} cells) and a value list ({} values) are set",
            cells.len(),
            values.len()
        )));
    }
    let listed = cells.len() + values.len();

    let spec = match (config.row, config.col) {
        (Some(row), Some(col)) => {
            let fixed = FieldCell::new(config.sheet.clone(), row, col);
            match (cells.first(), values.first(), listed) {
                (_, _, 0) => FieldSpec::Constant {
                    cell: fixed,
                    value: None,
                },
                (Some(cell), None, 1) if *cell == fixed => FieldSpec::Constant {
                    cell: fixed,
                    value: None,
                },
                (None, Some((cell, value)), 1) if *cell == fixed => FieldSpec::Constant {
                    cell: fixed,
                    value: Some(value.clone()),
                },
                _ => {
                    return Err(issue(format!(
                        "fixed cell {} disagrees with its list of {} entries",
                        fixed.address(),
                        listed
                    )))
                }
            }
        }
        (Some(_), None) | (None, Some(_)) if listed > 0 => {
            return Err(issue(
                "a fixed row or column cannot be combined with a cell or value list".to_string(),
            ))
        }
        _ => match (cells.len(), values.len()) {
            (1, _) => FieldSpec::Constant {
                cell: cells[0].clone(),
                value: None,
            },
            (_, 1) => {
                let (cell, value) = values[0].clone();
                FieldSpec::Constant {
                    cell,
                    value: Some(value),
                }
            }
            (n, _) if n > 0 => FieldSpec::CellList(cells),
            (_, n) if n > 0 => FieldSpec::ValueList(values),
            _ => match (config.col, config.row) {
                (Some(col), _) => FieldSpec::ColumnScan {
                    sheet: config.sheet.clone(),
                    col,
                    first_row: config.first_row.unwrap_or(0),
                },
                (None, Some(row)) => FieldSpec::RowScan {
                    sheet: config.sheet.clone(),
                    row,
                },
                (None, None) => FieldSpec::Void,
            },
        },
    };

    if config.first_row.is_some() && !matches!(spec, FieldSpec::ColumnScan { .. }) {
        return Err(issue(format!(
            "first_row only applies to a column scan, but the field is a {}",
            spec.kind()
        )));
    }

    tracing::debug!("Field '{}' classified as {}", config.name, spec.kind());
    Ok(spec)
}

/// Explicit cells plus every cell of every range, in configuration order
fn list_cells(config: &FieldConfig) -> Result<Vec<FieldCell>, String> {
    let from_ranges: u64 = config.ranges.iter().map(|r| r.range.cell_count()).sum();
    if from_ranges > MAX_LIST_CELLS {
        return Err(format!(
            "ranges cover {} cells, more than the limit of {}",
            from_ranges, MAX_LIST_CELLS
        ));
    }

    let mut cells: Vec<FieldCell> = config.cells.iter().map(|c| locate(config, c)).collect();
    for range in &config.ranges {
        cells.extend(range.cells().map(|c| locate(config, &c)));
    }
    Ok(cells)
}

/// Qualify a cell reference with the field's sheet when it has none
fn locate(config: &FieldConfig, cell: &CellRef) -> FieldCell {
    let sheet = match &cell.sheet {
        Some(name) => Some(SheetRef::Name(name.clone())),
        None => config.sheet.clone(),
    };
    FieldCell::new(sheet, cell.address.row, cell.address.col)
}

/// Names used by more than one field
pub fn duplicate_names(fields: &[Field]) -> Vec<FieldIssue> {
    let mut seen = ahash::AHashSet::new();
    let mut reported = ahash::AHashSet::new();
    let mut issues = Vec::new();
    for field in fields {
        if !seen.insert(field.name()) && reported.insert(field.name()) {
            issues.push(FieldIssue::new(field.name(), "duplicate field name"));
        }
    }
    issues
}
