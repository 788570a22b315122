//! CSV options

/// Options for reading CSV files
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether the first line is a header.
    ///
    /// Header values are always stored as text in row 0. Without a header the
    /// first line goes through type detection like any other.
    pub has_header: bool,
    /// Automatic type detection
    pub auto_detect_types: bool,
    /// Name of the produced worksheet.
    ///
    /// `None` means the file stem for [`CsvReader::read_file`] and `Sheet1`
    /// otherwise.
    ///
    /// [`CsvReader::read_file`]: crate::CsvReader::read_file
    pub sheet_name: Option<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_header: false,
            auto_detect_types: true,
            sheet_name: None,
        }
    }
}

impl CsvReadOptions {
    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Treat the first line as a text header
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Enable or disable type detection
    pub fn with_type_detection(mut self, enabled: bool) -> Self {
        self.auto_detect_types = enabled;
        self
    }

    /// Name the produced worksheet
    pub fn with_sheet_name<S: Into<String>>(mut self, name: S) -> Self {
        self.sheet_name = Some(name.into());
        self
    }
}
