//! Bounded record iteration over row groups.
//!
//! [`materialize`] turns a [`RowGroupSource`] into a lazy stream of
//! [`Record`]s capped at `limit` records across all row groups. [`WitFile`]
//! wires that up for a Parquet file on disk or in memory.
//!
//! The iterator is a small state machine:
//!
//! ```text
//! Fetching --(group)--> Emitting --(row, under cap)--> emit, stay
//!    |                     |--(row, cap reached)----> Done(LimitReached)
//!    |                     '--(group exhausted)-----> Fetching
//!    '--(no group left)--> Done(Exhausted)
//! ```
//!
//! Any error moves to `Failed`. The current row group lives inside the
//! `Emitting` state, so leaving that state in any way drops it.

use std::fs::File;
use std::iter::FusedIterator;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parquet::file::reader::{ChunkReader, FileReader, SerializedFileReader};
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{
    MaterializeSnafu, OpenFileSnafu, ParquetFooterSnafu, ReadError, ReadResult, SchemaSnafu,
    SourceSnafu,
};
use crate::record::{Record, check_layout, read_row};
use crate::schema::{Schema, parse_schema};
use crate::source::{ParquetRowGroupSource, RowGroup, RowGroupSource};

/// Why a [`RecordIter`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// More rows were available but the record cap had been reached.
    LimitReached,
    /// Every row of every row group was produced.
    Exhausted,
}

/// Final outcome of a completed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    /// Records produced.
    pub produced: usize,
    /// Why iteration stopped.
    pub termination: Termination,
}

enum State<G> {
    Fetching,
    Emitting { group: G, next_row: usize },
    Done(Termination),
    Failed,
}

/// Lazy, finite, non-restartable stream of records.
///
/// Yields at most `limit` records. After the first error it yields nothing
/// more.
pub struct RecordIter<'a, S: RowGroupSource> {
    schema: &'a Schema,
    source: S,
    limit: usize,
    produced: usize,
    groups_fetched: usize,
    layout_checked: bool,
    state: State<S::Group>,
}

/// Materialize at most `limit` records from `source`, in file order.
pub fn materialize<S: RowGroupSource>(
    schema: &Schema,
    source: S,
    limit: usize,
) -> RecordIter<'_, S> {
    RecordIter {
        schema,
        source,
        limit,
        produced: 0,
        groups_fetched: 0,
        layout_checked: false,
        state: State::Fetching,
    }
}

impl<S: RowGroupSource> RecordIter<'_, S> {
    /// Records produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Row groups fetched so far.
    pub fn groups_fetched(&self) -> usize {
        self.groups_fetched
    }

    /// Outcome once iteration finished normally; `None` while still running
    /// or after an error.
    pub fn summary(&self) -> Option<ReadSummary> {
        match self.state {
            State::Done(termination) => Some(ReadSummary {
                produced: self.produced,
                termination,
            }),
            _ => None,
        }
    }

    fn finish(&mut self, termination: Termination) {
        self.state = State::Done(termination);
        info!(
            produced = self.produced,
            groups = self.groups_fetched,
            ?termination,
            "record read finished"
        );
    }

    fn fail(&mut self, err: &ReadError) {
        self.state = State::Failed;
        warn!(
            produced = self.produced,
            row_group = self.groups_fetched.saturating_sub(1),
            error = %err,
            "record read aborted"
        );
    }
}

impl<S: RowGroupSource> Iterator for RecordIter<'_, S> {
    type Item = ReadResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Fetching => match self.source.next_row_group().context(SourceSnafu) {
                    Ok(Some(group)) => {
                        debug!(
                            row_group = self.groups_fetched,
                            rows = group.row_count(),
                            "entering row group"
                        );
                        self.groups_fetched += 1;
                        self.state = State::Emitting { group, next_row: 0 };
                    }
                    Ok(None) => {
                        self.finish(Termination::Exhausted);
                        return None;
                    }
                    Err(err) => {
                        self.fail(&err);
                        return Some(Err(err));
                    }
                },
                State::Emitting { group, next_row } => {
                    if *next_row >= group.row_count() {
                        self.state = State::Fetching;
                        continue;
                    }
                    if self.produced >= self.limit {
                        self.finish(Termination::LimitReached);
                        return None;
                    }

                    let row = *next_row;
                    *next_row += 1;
                    // The schema is fixed for the whole read; check it before the first cell.
                    if !self.layout_checked {
                        if let Err(err) = check_layout(self.schema, row).context(MaterializeSnafu) {
                            self.fail(&err);
                            return Some(Err(err));
                        }
                        self.layout_checked = true;
                    }
                    return match read_row(group, row) {
                        Ok(record) => {
                            self.produced += 1;
                            Some(Ok(record))
                        }
                        Err(err) => {
                            self.fail(&err);
                            Some(Err(err))
                        }
                    };
                }
                State::Done(_) | State::Failed => return None,
            }
        }
    }
}

impl<S: RowGroupSource> FusedIterator for RecordIter<'_, S> {}

/// An open WIT export: the Parquet reader plus its parsed schema.
pub struct WitFile<R: ChunkReader + 'static> {
    reader: Arc<SerializedFileReader<R>>,
    schema: Schema,
}

impl WitFile<File> {
    /// Open a Parquet file on disk and parse its footer and schema.
    pub fn open(path: impl AsRef<Path>) -> ReadResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(OpenFileSnafu {
            path: path.display().to_string(),
        })?;
        Self::new(file)
    }
}

impl WitFile<Bytes> {
    /// Read a complete Parquet file held in memory.
    pub fn from_bytes(data: Bytes) -> ReadResult<Self> {
        Self::new(data)
    }
}

impl<R: ChunkReader + 'static> WitFile<R> {
    /// Parse the footer and schema of `input`. No row group is read.
    pub fn new(input: R) -> ReadResult<Self> {
        let reader = SerializedFileReader::new(input).context(ParquetFooterSnafu)?;
        let schema =
            parse_schema(reader.metadata().file_metadata().schema()).context(SchemaSnafu)?;
        debug!(
            columns = schema.len(),
            row_groups = reader.metadata().num_row_groups(),
            "opened parquet file"
        );
        Ok(Self {
            reader: Arc::new(reader),
            schema,
        })
    }

    /// The file's flat schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Total rows across all row groups, from the footer.
    pub fn num_rows(&self) -> i64 {
        self.reader.metadata().file_metadata().num_rows()
    }

    /// Number of row groups in the file.
    pub fn num_row_groups(&self) -> usize {
        self.reader.metadata().num_row_groups()
    }

    /// Iterate over at most `limit` records.
    pub fn records(&self, limit: usize) -> RecordIter<'_, ParquetRowGroupSource<R>> {
        materialize(
            &self.schema,
            ParquetRowGroupSource::new(Arc::clone(&self.reader)),
            limit,
        )
    }
}
