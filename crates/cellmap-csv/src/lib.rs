//! # cellmap-csv
//!
//! CSV decoder for cellmap. Each delimited file becomes one [`Worksheet`]
//! whose cells the extraction engine can scan.
//!
//! [`Worksheet`]: cellmap_core::Worksheet

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
