//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while decoding CSV
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Record too wide or too long for a worksheet
    #[error("CSV input exceeds worksheet bounds at line {line}: {source}")]
    Bounds {
        line: u64,
        #[source]
        source: cellmap_core::Error,
    },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] cellmap_core::Error),
}
