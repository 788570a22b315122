//! Sheet-qualified cell coordinates

use super::CellAddress;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell position within a workbook: `(sheet, row, col)`
///
/// Equality is by sheet name and position. Ordering across sheets depends on
/// the order sheets are scanned in, which is not known here, so the type
/// deliberately does not implement `Ord`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellCoordinate {
    /// Sheet name
    pub sheet: String,
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based)
    pub col: u16,
}

impl CellCoordinate {
    /// Create a new coordinate
    pub fn new<S: Into<String>>(sheet: S, row: u32, col: u16) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
        }
    }

    /// The in-sheet part of this coordinate
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }

    /// Parse a `Sheet!A1` or `'My Sheet'!A1` reference
    ///
    /// # Examples
    /// ```
    /// use cellmap_core::CellCoordinate;
    ///
    /// let coord = CellCoordinate::parse("'Q1 Data'!C4").unwrap();
    /// assert_eq!(coord, CellCoordinate::new("Q1 Data", 3, 2));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        match Self::split_sheet_prefix(s)? {
            (Some(sheet), rest) => {
                let addr = CellAddress::parse(rest)?;
                Ok(Self::new(sheet, addr.row, addr.col))
            }
            (None, _) => Err(Error::InvalidAddress(format!(
                "missing sheet name in '{}'",
                s.trim()
            ))),
        }
    }

    /// Split an optional `Sheet!` prefix from a reference
    ///
    /// Returns the unquoted sheet name (if any) and the remaining reference text.
    pub fn split_sheet_prefix(s: &str) -> Result<(Option<String>, &str)> {
        let s = s.trim();

        if let Some(quoted) = s.strip_prefix('\'') {
            // Quoted names escape an embedded quote as ''
            let mut name = String::new();
            let mut chars = quoted.char_indices().peekable();
            while let Some((i, c)) = chars.next() {
                if c != '\'' {
                    name.push(c);
                    continue;
                }
                if let Some(&(_, '\'')) = chars.peek() {
                    chars.next();
                    name.push('\'');
                    continue;
                }
                let rest = &quoted[i + 1..];
                return match rest.strip_prefix('!') {
                    Some(rest) if !name.is_empty() => Ok((Some(name), rest)),
                    _ => Err(Error::InvalidAddress(format!(
                        "expected '!' after quoted sheet name in '{}'",
                        s
                    ))),
                };
            }
            return Err(Error::InvalidAddress(format!(
                "unterminated sheet name in '{}'",
                s
            )));
        }

        match s.rsplit_once('!') {
            Some(("", _)) => Err(Error::InvalidAddress(format!(
                "empty sheet name in '{}'",
                s
            ))),
            Some((sheet, rest)) => Ok((Some(sheet.to_string()), rest)),
            None => Ok((None, s)),
        }
    }

    /// Format a sheet name for use in a reference, quoting when needed
    pub fn quote_sheet_name(name: &str) -> String {
        let plain = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if plain {
            name.to_string()
        } else {
            format!("'{}'", name.replace('\'', "''"))
        }
    }
}

impl fmt::Display for CellCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}",
            Self::quote_sheet_name(&self.sheet),
            self.address()
        )
    }
}

impl FromStr for CellCoordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
