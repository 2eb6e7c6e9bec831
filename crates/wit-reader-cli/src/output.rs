//! Rendering of the schema block, records and closing summary.

use std::io::Write;

use snafu::ResultExt;
use wit_reader_core::{ReadSummary, Record, Schema, Termination};

use crate::error::{CliResult, SerializeRecordSnafu, WriteOutputSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `{"time": "...", "water": 0.1, ...}` per record.
    Display,
    /// One JSON object per line.
    Jsonl,
}

pub fn write_schema<W: Write>(out: &mut W, schema: &Schema) -> CliResult<()> {
    writeln!(out, "{schema}").context(WriteOutputSnafu)?;
    writeln!(out, "Iterating through schema fields:").context(WriteOutputSnafu)?;
    for field in schema.fields() {
        writeln!(out, "{} {}", field.physical_type().parquet_name(), field.name())
            .context(WriteOutputSnafu)?;
    }
    writeln!(out).context(WriteOutputSnafu)
}

pub fn write_data_header<W: Write>(out: &mut W) -> CliResult<()> {
    writeln!(out, "Reading some data:").context(WriteOutputSnafu)
}

pub fn write_record<W: Write>(out: &mut W, record: &Record, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Display => writeln!(out, "{record}").context(WriteOutputSnafu),
        OutputFormat::Jsonl => {
            serde_json::to_writer(&mut *out, record).context(SerializeRecordSnafu)?;
            writeln!(out).context(WriteOutputSnafu)
        }
    }
}

pub fn write_summary<W: Write>(out: &mut W, summary: ReadSummary) -> CliResult<()> {
    match summary.termination {
        Termination::LimitReached => {
            writeln!(out, "Retrieved the first {} records", summary.produced)
        }
        Termination::Exhausted => writeln!(out, "Retrieved all {} records", summary.produced),
    }
    .context(WriteOutputSnafu)
}
