//! Typed record reader for WIT (Wetlands Insight Tool) parquet exports.
//!
//! This crate reads the flat parquet files produced by the WIT pipeline and
//! materializes each row into a [`Record`]:
//!
//! - A flat, positional schema model with nested/repeated fields rejected
//!   (`schema` module).
//! - An exact INT96 Julian-day timestamp codec (`timestamp` module).
//! - A row-group source abstraction with a lazily decoding Parquet adapter
//!   (`source` module).
//! - A fixed-layout row materializer (`record` module) and a bounded record
//!   iterator that caps output across row groups (`reader` module).
//!
//! ```no_run
//! use wit_reader_core::WitFile;
//!
//! # fn main() -> Result<(), wit_reader_core::ReadError> {
//! let file = WitFile::open("in/sampledata.parquet")?;
//! let mut records = file.records(3);
//! for record in records.by_ref() {
//!     println!("{}", record?);
//! }
//! println!("{:?}", records.summary());
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod error;
pub mod reader;
pub mod record;
pub mod schema;
pub mod source;
pub mod timestamp;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::{ReadError, ReadResult};
pub use reader::{ReadSummary, RecordIter, Termination, WitFile, materialize};
pub use record::{
    ExpectedType, MaterializationError, MaterializationErrorKind, RECORD_LAYOUT, Record,
    materialize_row,
};
pub use schema::{FieldDescriptor, PhysicalType, Schema, SchemaError, parse_schema};
pub use source::{Cell, RowGroup, RowGroupSource, SourceError};
pub use timestamp::{EpochTimestamp, Int96Timestamp, decode_timestamp, encode_timestamp};
