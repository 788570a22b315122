//! cellmap CLI - extract records from sheets of cells

mod output;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cellmap::field::Field;
use cellmap::{ExtractConfig, Extractor, Workbook};
use cellmap_csv::{CsvReadOptions, CsvReader};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, RecordWriter};

#[derive(Parser)]
#[command(name = "cellmap")]
#[command(author, version, about = "Extract flat records from sheets of cells")]
struct Cli {
    /// More logging on stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records and write them to stdout or a file
    Extract {
        /// Field configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// CSV files, one sheet each, scanned in this order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Stop after this many records
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter of the input files and of CSV output
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Text written for absent values in CSV output
        #[arg(long, default_value = "")]
        null: String,
    },

    /// Check a field configuration, optionally against input files
    Check {
        /// Field configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// CSV files to count expected values in
        inputs: Vec<PathBuf>,

        /// Field delimiter of the input files
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// List the sheets the input files become
    Sheets {
        /// CSV files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Field delimiter of the input files
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            config,
            inputs,
            format,
            limit,
            output,
            delimiter,
            null,
        } => extract(
            &config,
            &inputs,
            format,
            limit,
            output.as_deref(),
            delimiter,
            &null,
        ),
        Commands::Check {
            config,
            inputs,
            delimiter,
        } => check(&config, &inputs, delimiter),
        Commands::Sheets { inputs, delimiter } => list_sheets(&inputs, delimiter),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("Delimiter '{}' is not a single-byte character", delimiter);
    }
    Ok(delimiter as u8)
}

fn load_config(path: &Path) -> Result<ExtractConfig> {
    ExtractConfig::from_path(path)
        .with_context(|| format!("Failed to load field configuration '{}'", path.display()))
}

fn load_workbook(inputs: &[PathBuf], delimiter: char) -> Result<Workbook> {
    let options = CsvReadOptions::default().with_delimiter(delimiter_byte(delimiter)?);
    CsvReader::read_workbook(inputs, &options).context("Failed to read input files")
}

fn extract(
    config: &Path,
    inputs: &[PathBuf],
    format: OutputFormat,
    limit: Option<usize>,
    output: Option<&Path>,
    delimiter: char,
    null: &str,
) -> Result<()> {
    let mut config = load_config(config)?;
    if limit.is_some() {
        config.options.record_limit = limit;
    }
    let workbook = load_workbook(inputs, delimiter)?;
    let extractor = Extractor::from_config(config);
    let records = extractor
        .extract(&workbook)
        .context("Failed to start extraction")?;

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let sink = BufWriter::new(sink);

    let names: Vec<&str> = extractor.fields().iter().map(Field::name).collect();
    let mut writer = match format {
        OutputFormat::Csv => RecordWriter::csv(sink, &names, delimiter_byte(delimiter)?, null)?,
        OutputFormat::Json => RecordWriter::json(sink),
    };
    for record in records {
        writer.write(&record).context("Failed to write record")?;
    }
    let written = writer.written();
    writer.finish().context("Failed to flush output")?;

    if let Some(path) = output {
        eprintln!("Wrote {} records to '{}'", written, path.display());
    }
    Ok(())
}

fn check(config: &Path, inputs: &[PathBuf], delimiter: char) -> Result<()> {
    let extractor = Extractor::from_config(load_config(config)?);

    for field in extractor.fields() {
        match field.spec() {
            Ok(spec) => println!("{}\t{}", field.name(), spec.kind()),
            Err(issue) => println!("{}\tmisconfigured: {}", field.name(), issue.reason),
        }
    }

    let report = extractor.report();
    for name in &report.void {
        eprintln!("Warning: field '{}' has no addressing and is always absent", name);
    }
    if !report.is_clean() {
        for issue in &report.misconfigured {
            eprintln!("Error: {}", issue);
        }
        bail!("{} misconfigured field(s)", report.misconfigured.len());
    }

    if inputs.is_empty() {
        return Ok(());
    }
    let workbook = load_workbook(inputs, delimiter)?;
    println!();
    for count in extractor
        .expected_counts(&workbook)
        .context("Failed to count expected values")?
    {
        println!("{}\t{}\t{}", count.field, count.sheet, count.count);
    }
    Ok(())
}

fn list_sheets(inputs: &[PathBuf], delimiter: char) -> Result<()> {
    let workbook = load_workbook(inputs, delimiter)?;

    for (i, sheet) in workbook.worksheets().enumerate() {
        let range = sheet
            .used_range()
            .map_or_else(|| "empty".to_string(), |r| r.to_string());
        println!("{}\t{}\t{}\t{} cells", i, sheet.name(), range, sheet.cell_count());
    }
    Ok(())
}
