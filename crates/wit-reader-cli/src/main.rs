//! CLI tool for reading WIT parquet exports.

mod error;
mod output;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use snafu::ResultExt;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};
use wit_reader_core::{ReadSummary, Termination, WitFile};

use crate::{
    error::{CliResult, OpenInputSnafu, ReadRecordsSnafu, WriteOutputSnafu},
    output::{OutputFormat, write_data_header, write_record, write_schema, write_summary},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Display,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Display => OutputFormat::Display,
            FormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "witread", version, about = "Read records from a WIT parquet export")]
struct Cli {
    /// Path to the parquet file.
    path: PathBuf,

    /// Maximum number of records to print.
    #[arg(long, default_value_t = 3)]
    limit: usize,

    /// How each record is printed.
    #[arg(long, value_enum, default_value_t = FormatArg::Display)]
    format: FormatArg,

    /// Skip the schema block.
    #[arg(long)]
    no_schema: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let path = cli.path.display().to_string();
    debug!(path = %path, limit = cli.limit, "opening WIT file");

    let file = WitFile::open(&cli.path).context(OpenInputSnafu { path: path.clone() })?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if !cli.no_schema {
        write_schema(&mut out, file.schema())?;
    }
    write_data_header(&mut out)?;

    let format = OutputFormat::from(cli.format);
    let mut records = file.records(cli.limit);
    while let Some(next) = records.next() {
        let record = next.context(ReadRecordsSnafu {
            path: path.clone(),
            produced: records.produced(),
        })?;
        write_record(&mut out, &record, format)?;
    }

    // A finished iterator always has a summary; fall back to the count seen.
    let summary = records.summary().unwrap_or(ReadSummary {
        produced: records.produced(),
        termination: Termination::Exhausted,
    });
    write_summary(&mut out, summary)?;
    out.flush().context(WriteOutputSnafu)
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
