//! Prelude module - common imports for cellmap users
//!
//! ```rust
//! use cellmap::prelude::*;
//! ```

pub use crate::{
    // Grid model
    CellAddress,
    CellRange,
    CellValue,
    Grid,
    Workbook,
    Worksheet,

    // Configuration
    CellRef,
    ExtractConfig,
    ExtractOptions,
    FieldConfig,
    RangeRef,
    SheetRef,
    ValueType,

    // Extraction
    Extractor,
    Record,
    RecordOrigin,

    // Error types
    ExtractError,
    ExtractResult,
};
