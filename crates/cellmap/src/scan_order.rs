//! Total order over cells: sheet visit order, then row, then column

use std::cmp::Ordering;

use ahash::AHashMap;
use cellmap_core::CellCoordinate;

use crate::error::{ExtractError, ExtractResult};
use crate::grid::Grid;

/// Position of a sheet in the scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SheetRank(u32);

impl SheetRank {
    /// Rank given to sheets outside the scan order. Sorts after every real
    /// sheet and never matches a visited cell.
    pub const UNREACHABLE: SheetRank = SheetRank(u32::MAX);

    /// Rank of the `index`-th scanned sheet
    pub fn new(index: u32) -> Self {
        SheetRank(index)
    }

    /// Index into the scan order, `None` when unreachable
    pub fn index(self) -> Option<usize> {
        if self.is_reachable() {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    pub fn is_reachable(self) -> bool {
        self != Self::UNREACHABLE
    }
}

/// A cell position under the scan order
///
/// The derived `Ord` compares sheet rank first, then row, then column, which
/// is exactly the order the scan visits cells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanKey {
    pub sheet: SheetRank,
    pub row: u32,
    pub col: u16,
}

impl ScanKey {
    pub fn new(sheet: SheetRank, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }
}

/// The ranking of sheet names used to drive one scan
#[derive(Debug, Clone, Default)]
pub struct ScanOrder {
    sheets: Vec<String>,
    ranks: AHashMap<String, SheetRank>,
}

impl ScanOrder {
    /// Build an order from sheet names, first one scanned first
    ///
    /// A repeated name keeps its first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Self::default();
        for name in names {
            let name = name.into();
            if order.ranks.contains_key(&name) {
                tracing::debug!("Ignoring repeated sheet '{name}' in scan order");
                continue;
            }
            let rank = SheetRank(order.sheets.len() as u32);
            order.ranks.insert(name.clone(), rank);
            order.sheets.push(name);
        }
        order
    }

    /// The grid's own document order
    pub fn from_grid<G: Grid + ?Sized>(grid: &G) -> Self {
        Self::new(grid.sheet_names())
    }

    /// An explicit order, checked against the grid
    pub fn with_sheets<G: Grid + ?Sized>(grid: &G, sheets: &[String]) -> ExtractResult<Self> {
        let available = grid.sheet_names();
        if let Some(missing) = sheets
            .iter()
            .find(|name| !available.contains(&name.as_str()))
        {
            return Err(ExtractError::UnknownSheet(missing.clone()));
        }
        Ok(Self::new(sheets.iter().cloned()))
    }

    /// Rank of a sheet, [`SheetRank::UNREACHABLE`] if it is not scanned
    pub fn rank(&self, sheet: &str) -> SheetRank {
        self.ranks
            .get(sheet)
            .copied()
            .unwrap_or(SheetRank::UNREACHABLE)
    }

    /// Name of the sheet at `rank`
    pub fn sheet_name(&self, rank: SheetRank) -> Option<&str> {
        rank.index()
            .and_then(|i| self.sheets.get(i))
            .map(String::as_str)
    }

    /// Scanned sheets, in order
    pub fn sheets(&self) -> &[String] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Map a coordinate onto the scan order
    pub fn key(&self, coord: &CellCoordinate) -> ScanKey {
        ScanKey::new(self.rank(&coord.sheet), coord.row, coord.col)
    }

    /// Compare two coordinates by `(rank(sheet), row, col)`
    pub fn compare(&self, a: &CellCoordinate, b: &CellCoordinate) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }
}
