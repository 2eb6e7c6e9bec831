//! Row-group sources.
//!
//! The record iterator only needs two capabilities from the container: hand
//! out row groups in file order, and read one decoded cell of the current
//! group by `(row, column position)`. [`RowGroupSource`] and [`RowGroup`]
//! capture exactly that, so the iteration logic runs unchanged against the
//! Parquet adapter in [`parquet`] or against an in-memory source in tests.
//!
//! A row group handle owns whatever buffers it decoded. Dropping the handle
//! releases them.

pub mod parquet;

use ::parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

use crate::schema::PhysicalType;
use crate::timestamp::Int96Timestamp;

pub use self::parquet::{ParquetRowGroup, ParquetRowGroupSource};

/// One decoded cell value, typed by the column's physical type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// An INT96 Julian-day timestamp.
    Int96(Int96Timestamp),
    /// A DOUBLE value.
    Double(f64),
    /// A BYTE_ARRAY value that decoded as UTF-8.
    Text(String),
    /// A value of a type the record layout never reads.
    Other(PhysicalType),
}

impl Cell {
    /// Physical type the cell was decoded from.
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            Cell::Int96(_) => PhysicalType::Int96,
            Cell::Double(_) => PhysicalType::Double,
            Cell::Text(_) => PhysicalType::Utf8String,
            Cell::Other(physical) => *physical,
        }
    }
}

/// Errors raised while acquiring or reading a row group.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SourceError {
    /// The Parquet reader failed on a row group or column chunk.
    #[snafu(display("Parquet read error in row group {row_group}: {source}"))]
    Parquet {
        /// Row group being read.
        row_group: usize,
        /// Underlying Parquet error.
        source: ParquetError,
        /// Backtrace captured at the failure site.
        backtrace: Backtrace,
    },

    /// A BYTE_ARRAY cell does not hold valid UTF-8.
    #[snafu(display(
        "Invalid UTF-8 in row group {row_group}, row {row}, column {position}: {source}"
    ))]
    InvalidUtf8 {
        /// Row group being read.
        row_group: usize,
        /// Row index within the group.
        row: usize,
        /// Column position.
        position: usize,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// Row-group metadata reports a negative row count.
    #[snafu(display("Row group {row_group} reports an invalid row count {num_rows}"))]
    InvalidRowCount {
        /// Row group being read.
        row_group: usize,
        /// Row count found in the metadata.
        num_rows: i64,
    },

    /// A non-Parquet source could not produce a row group.
    #[snafu(display("Row group {row_group} unavailable: {message}"))]
    Unavailable {
        /// Row group being read.
        row_group: usize,
        /// Description of the failure.
        message: String,
    },
}

/// Positional access to the rows of one row group.
pub trait RowGroup {
    /// Number of rows in the group. Must not require decoding any column.
    fn row_count(&self) -> usize;

    /// Decoded value at `(row, position)`.
    ///
    /// Returns `Ok(None)` when the column does not exist or the value is null.
    fn cell(&mut self, row: usize, position: usize) -> Result<Option<Cell>, SourceError>;
}

/// Sequential producer of row groups in file order.
pub trait RowGroupSource {
    /// Row group handle produced by this source.
    type Group: RowGroup;

    /// Next row group, or `Ok(None)` once every group has been handed out.
    fn next_row_group(&mut self) -> Result<Option<Self::Group>, SourceError>;
}
