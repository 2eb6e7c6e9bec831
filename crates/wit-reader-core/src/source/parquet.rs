//! Row-group source backed by the `parquet` crate's serialized file reader.
//!
//! Fetching a row group only looks at footer metadata (the row count). A
//! column chunk is decoded the first time one of its cells is requested,
//! through the typed column readers, and cached on the group handle until the
//! handle is dropped. INT96 values are kept as their raw words so no
//! precision is lost before [`crate::timestamp::decode_timestamp`] runs.

use std::sync::Arc;

use parquet::column::reader::{ColumnReader, ColumnReaderImpl};
use parquet::data_type::DataType;
use parquet::file::reader::{ChunkReader, FileReader, SerializedFileReader};
use snafu::prelude::*;
use tracing::debug;

use super::{
    Cell, InvalidRowCountSnafu, InvalidUtf8Snafu, ParquetSnafu, RowGroup, RowGroupSource,
    SourceError,
};
use crate::schema::PhysicalType;
use crate::timestamp::Int96Timestamp;

const READ_BATCH_SIZE: usize = 8192;

/// Hands out the row groups of a Parquet file in order.
pub struct ParquetRowGroupSource<R: ChunkReader + 'static> {
    reader: Arc<SerializedFileReader<R>>,
    next_index: usize,
}

impl<R: ChunkReader + 'static> ParquetRowGroupSource<R> {
    /// Start at the first row group of `reader`.
    pub fn new(reader: Arc<SerializedFileReader<R>>) -> Self {
        Self {
            reader,
            next_index: 0,
        }
    }
}

impl<R: ChunkReader + 'static> RowGroupSource for ParquetRowGroupSource<R> {
    type Group = ParquetRowGroup<R>;

    fn next_row_group(&mut self) -> Result<Option<Self::Group>, SourceError> {
        let metadata = self.reader.metadata();
        if self.next_index >= metadata.num_row_groups() {
            return Ok(None);
        }

        let index = self.next_index;
        self.next_index += 1;

        let num_rows = metadata.row_group(index).num_rows();
        let row_count = usize::try_from(num_rows).map_err(|_| {
            InvalidRowCountSnafu {
                row_group: index,
                num_rows,
            }
            .build()
        })?;
        let num_columns = metadata.file_metadata().schema_descr().num_columns();

        debug!(row_group = index, rows = row_count, "fetched parquet row group");

        Ok(Some(ParquetRowGroup {
            reader: Arc::clone(&self.reader),
            index,
            row_count,
            columns: (0..num_columns).map(|_| None).collect(),
        }))
    }
}

/// One row group of a Parquet file with lazily decoded columns.
pub struct ParquetRowGroup<R: ChunkReader + 'static> {
    reader: Arc<SerializedFileReader<R>>,
    index: usize,
    row_count: usize,
    columns: Vec<Option<DecodedColumn>>,
}

impl<R: ChunkReader + 'static> ParquetRowGroup<R> {
    /// Zero-based index of the group within the file.
    pub fn index(&self) -> usize {
        self.index
    }

    fn decode_column(&self, position: usize) -> Result<DecodedColumn, SourceError> {
        let row_group = self.index;
        let descr = self
            .reader
            .metadata()
            .file_metadata()
            .schema_descr()
            .column(position);
        let max_def_level = descr.max_def_level();

        let group_reader = self
            .reader
            .get_row_group(row_group)
            .context(ParquetSnafu { row_group })?;
        let column_reader = group_reader
            .get_column_reader(position)
            .context(ParquetSnafu { row_group })?;

        let decoded = match column_reader {
            ColumnReader::Int96ColumnReader(mut typed) => {
                let values = drain_column(&mut typed, self.row_count, max_def_level)
                    .context(ParquetSnafu { row_group })?;
                DecodedColumn::Int96(
                    values
                        .iter()
                        .map(|v| v.as_ref().map(Int96Timestamp::from))
                        .collect(),
                )
            }
            ColumnReader::DoubleColumnReader(mut typed) => DecodedColumn::Double(
                drain_column(&mut typed, self.row_count, max_def_level)
                    .context(ParquetSnafu { row_group })?,
            ),
            ColumnReader::ByteArrayColumnReader(mut typed) => {
                let values = drain_column(&mut typed, self.row_count, max_def_level)
                    .context(ParquetSnafu { row_group })?;
                let texts = values
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| {
                        value
                            .map(|bytes| {
                                bytes.as_utf8().map(str::to_owned).context(InvalidUtf8Snafu {
                                    row_group,
                                    row,
                                    position,
                                })
                            })
                            .transpose()
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                DecodedColumn::Text(texts)
            }
            _ => DecodedColumn::Other(PhysicalType::from_parquet(
                descr.physical_type(),
                descr.converted_type(),
                descr.type_length(),
            )),
        };

        debug!(row_group, position, "decoded column chunk");
        Ok(decoded)
    }
}

impl<R: ChunkReader + 'static> RowGroup for ParquetRowGroup<R> {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn cell(&mut self, row: usize, position: usize) -> Result<Option<Cell>, SourceError> {
        if position >= self.columns.len() {
            return Ok(None);
        }
        if self.columns[position].is_none() {
            let decoded = self.decode_column(position)?;
            self.columns[position] = Some(decoded);
        }
        Ok(self.columns[position]
            .as_ref()
            .and_then(|column| column.cell(row)))
    }
}

/// Column chunk values, one entry per row; `None` marks a null.
enum DecodedColumn {
    Int96(Vec<Option<Int96Timestamp>>),
    Double(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Other(PhysicalType),
}

impl DecodedColumn {
    fn cell(&self, row: usize) -> Option<Cell> {
        match self {
            DecodedColumn::Int96(values) => values.get(row).copied().flatten().map(Cell::Int96),
            DecodedColumn::Double(values) => values.get(row).copied().flatten().map(Cell::Double),
            DecodedColumn::Text(values) => values.get(row).cloned().flatten().map(Cell::Text),
            DecodedColumn::Other(physical) => Some(Cell::Other(*physical)),
        }
    }
}

/// Read a whole column chunk, expanding definition levels into per-row
/// options. Values come back packed (nulls are not padded).
fn drain_column<T: DataType>(
    reader: &mut ColumnReaderImpl<T>,
    rows: usize,
    max_def_level: i16,
) -> parquet::errors::Result<Vec<Option<T::T>>> {
    let mut out = Vec::with_capacity(rows);
    let mut values: Vec<T::T> = Vec::with_capacity(READ_BATCH_SIZE);
    let mut def_levels: Vec<i16> = Vec::with_capacity(READ_BATCH_SIZE);

    loop {
        values.clear();
        def_levels.clear();

        let levels = if max_def_level > 0 {
            Some(&mut def_levels)
        } else {
            None
        };
        let (records_read, values_read, levels_read) =
            reader.read_records(READ_BATCH_SIZE, levels, None, &mut values)?;
        if records_read == 0 {
            break;
        }

        if max_def_level == 0 {
            out.extend(values.drain(..values_read).map(Some));
        } else {
            let mut packed = values.drain(..values_read);
            for &level in &def_levels[..levels_read] {
                if level == max_def_level {
                    out.push(packed.next());
                } else {
                    out.push(None);
                }
            }
        }
    }

    Ok(out)
}
