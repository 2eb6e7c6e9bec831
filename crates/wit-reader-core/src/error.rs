//! Error types and SNAFU context selectors for reading WIT exports.
//!
//! [`ReadError`] is what every public read operation returns. Component
//! errors ([`SchemaError`], [`SourceError`], [`MaterializationError`]) are kept
//! as `source` so callers can match on the specific failure.

use parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

use crate::record::MaterializationError;
use crate::schema::SchemaError;
use crate::source::SourceError;

/// Result alias for read operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Errors from opening a file and reading records from it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReadError {
    /// The input file could not be opened.
    #[snafu(display("Cannot open {path}: {source}"))]
    OpenFile {
        /// Path that was requested.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The Parquet footer could not be parsed.
    #[snafu(display("Invalid parquet footer: {source}"))]
    ParquetFooter {
        /// Underlying Parquet error.
        source: ParquetError,
        /// Backtrace captured at the failure site.
        backtrace: Backtrace,
    },

    /// The file schema is not a flat list of primitive fields.
    #[snafu(display("Unsupported schema: {source}"))]
    Schema {
        /// Underlying schema error.
        source: SchemaError,
    },

    /// A row group could not be acquired or read.
    #[snafu(display("Row group read failed: {source}"))]
    Source {
        /// Underlying source error.
        source: SourceError,
    },

    /// A row does not match the WIT record layout.
    #[snafu(display("Cannot materialize record: {source}"))]
    Materialize {
        /// Underlying materialization error.
        source: MaterializationError,
    },
}
