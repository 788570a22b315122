//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use cellmap_core::{CellValue, Workbook, Worksheet};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a worksheet
    ///
    /// Unless [`CsvReadOptions::sheet_name`] is set, the sheet is named after
    /// the file stem.
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let name = match &options.sheet_name {
            Some(name) => name.clone(),
            None => Self::sheet_name_for(path),
        };
        Self::read_named(file, &name, options)
    }

    /// Read CSV from a reader into a worksheet
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let name = options.sheet_name.as_deref().unwrap_or("Sheet1");
        Self::read_named(reader, name, options)
    }

    /// Read several CSV files into one workbook, one sheet per file
    ///
    /// Sheets keep argument order. Two files with the same stem are an error.
    pub fn read_workbook<P: AsRef<Path>>(
        paths: &[P],
        options: &CsvReadOptions,
    ) -> CsvResult<Workbook> {
        let per_file = CsvReadOptions {
            sheet_name: None,
            ..options.clone()
        };
        let mut workbook = Workbook::empty();
        for path in paths {
            let sheet = Self::read_file(path, &per_file)?;
            workbook.add_existing_worksheet(sheet)?;
        }
        Ok(workbook)
    }

    /// Sheet name derived from a file path
    pub fn sheet_name_for(path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        Workbook::sanitize_sheet_name(&stem)
    }

    fn read_named<R: Read>(reader: R, name: &str, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut worksheet = Worksheet::new(name);

        for (row_idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let is_header = options.has_header && row_idx == 0;

            for (col, field) in record.iter().enumerate() {
                let value = if is_header || !options.auto_detect_types {
                    Self::text(field)
                } else {
                    Self::detect_type(field)
                };
                if value.is_empty() {
                    continue;
                }

                let (row, col) = match (u32::try_from(row_idx), u16::try_from(col)) {
                    (Ok(row), Ok(col)) => (row, col),
                    _ => {
                        return Err(CsvError::Bounds {
                            line,
                            source: cellmap_core::Error::ColumnOutOfBounds(
                                col as u32,
                                cellmap_core::MAX_COLS - 1,
                            ),
                        })
                    }
                };
                worksheet
                    .set_cell_value_at(row, col, value)
                    .map_err(|source| CsvError::Bounds { line, source })?;
            }
        }

        Ok(worksheet)
    }

    fn text(field: &str) -> CellValue {
        if field.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::string(field)
        }
    }

    /// Detect the type of a field value
    ///
    /// Only the literal words `true` and `false` become booleans, so numeric
    /// codes such as `1` or `0` stay numbers.
    fn detect_type(field: &str) -> CellValue {
        let trimmed = field.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }

        // f64 parsing also accepts "inf" and "NaN", which are text here
        if trimmed.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }

        CellValue::string(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_type() {
        assert_eq!(CsvReader::detect_type(" 42 "), CellValue::Number(42.0));
        assert_eq!(CsvReader::detect_type("1"), CellValue::Number(1.0));
        assert_eq!(CsvReader::detect_type("-0.5e2"), CellValue::Number(-50.0));
        assert_eq!(CsvReader::detect_type("TRUE"), CellValue::Boolean(true));
        assert_eq!(CsvReader::detect_type("false"), CellValue::Boolean(false));
        assert_eq!(CsvReader::detect_type("yes"), CellValue::string("yes"));
        assert_eq!(CsvReader::detect_type("inf"), CellValue::string("inf"));
        assert_eq!(CsvReader::detect_type("   "), CellValue::Empty);
    }

    #[test]
    fn test_read_basic() {
        let data = "id,amount\n1,2.5\n2,,\n";
        let sheet = CsvReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();

        assert_eq!(sheet.name(), "Sheet1");
        assert_eq!(sheet.get_value_at(0, 0), CellValue::string("id"));
        assert_eq!(sheet.get_value_at(1, 1), CellValue::Number(2.5));
        // Blank fields are not stored
        assert_eq!(sheet.cell_count(), 5);
        assert_eq!(sheet.last_row(), Some(2));
        assert_eq!(sheet.last_col_in_row(2), Some(0));
    }

    #[test]
    fn test_header_stays_text() {
        let data = "2024,2025\n1,2\n";
        let options = CsvReadOptions::default().with_header(true);
        let sheet = CsvReader::read(data.as_bytes(), &options).unwrap();

        assert_eq!(sheet.get_value_at(0, 0), CellValue::string("2024"));
        assert_eq!(sheet.get_value_at(1, 1), CellValue::Number(2.0));
    }

    #[test]
    fn test_no_type_detection() {
        let options = CsvReadOptions::default()
            .with_type_detection(false)
            .with_delimiter(b';')
            .with_sheet_name("Raw");
        let sheet = CsvReader::read("1;true\n".as_bytes(), &options).unwrap();

        assert_eq!(sheet.name(), "Raw");
        assert_eq!(sheet.get_value_at(0, 0), CellValue::string("1"));
        assert_eq!(sheet.get_value_at(0, 1), CellValue::string("true"));
    }

    #[test]
    fn test_sheet_name_for() {
        assert_eq!(CsvReader::sheet_name_for(Path::new("/tmp/q1:sales.csv")), "q1_sales");
        assert_eq!(CsvReader::sheet_name_for(Path::new("")), "Sheet");
    }
}
