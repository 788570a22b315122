//! Record output

use std::io::Write;

use anyhow::Result;
use cellmap::{CellValue, Record};

/// Output format for extracted records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Delimited text with a header line
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    Json(W),
}

/// Writes records one at a time as they are extracted
pub struct RecordWriter<W: Write> {
    sink: Sink<W>,
    null: String,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    /// CSV output, starting with a header line of field names
    ///
    /// Absent values are written as `null`.
    pub fn csv(writer: W, fields: &[&str], delimiter: u8, null: &str) -> Result<Self> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        csv_writer.write_record(fields)?;
        Ok(Self {
            sink: Sink::Csv(csv_writer),
            null: null.to_string(),
            written: 0,
        })
    }

    /// JSON lines output. Absent values are `null`.
    pub fn json(writer: W) -> Self {
        Self {
            sink: Sink::Json(writer),
            null: String::new(),
            written: 0,
        }
    }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        match &mut self.sink {
            Sink::Csv(w) => {
                let row: Vec<String> = record
                    .values()
                    .iter()
                    .map(|v| cell_text(v.as_ref(), &self.null))
                    .collect();
                w.write_record(&row)?;
            }
            Sink::Json(w) => {
                serde_json::to_writer(&mut *w, record)?;
                w.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(self) -> Result<W> {
        match self.sink {
            Sink::Csv(w) => Ok(w.into_inner().map_err(|e| e.into_error())?),
            Sink::Json(mut w) => {
                w.flush()?;
                Ok(w)
            }
        }
    }
}

fn cell_text(value: Option<&CellValue>, null: &str) -> String {
    match value {
        None => null.to_string(),
        Some(v) => v.to_string(),
    }
}
