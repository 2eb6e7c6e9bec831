//! WIT records and the row materializer.
//!
//! A WIT export has a fixed column layout: an INT96 timestamp, five DOUBLE
//! fractions and two strings. [`Record`] is that layout as a struct, and
//! [`materialize_row`] fills one from a row of a [`RowGroup`] by position.

use std::fmt;

use serde::Serialize;
use snafu::prelude::*;

use crate::error::{MaterializeSnafu, ReadError, SourceSnafu};
use crate::schema::{PhysicalType, Schema};
use crate::source::{Cell, RowGroup};
use crate::timestamp::EpochTimestamp;

/// One row of a WIT export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Observation time.
    pub time: EpochTimestamp,
    /// Open water fraction.
    pub water: f64,
    /// Wet fraction.
    pub wet: f64,
    /// Bare soil fraction.
    pub bs: f64,
    /// Photosynthetic vegetation fraction.
    pub pv: f64,
    /// Non-photosynthetic vegetation fraction.
    pub npv: f64,
    /// Polygon geometry as WKT.
    pub geometry: String,
    /// Polygon identifier.
    pub uid: String,
}

/// One-line JSON-like rendering; the identifier is keyed `XXX_UID` as in the
/// exporter's own dumps.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"time\": \"{}\", \"water\": {:?}, \"wet\": {:?}, \"bs\": {:?}, \"pv\": {:?}, \"npv\": {:?}, \"geometry\": \"{}\", \"XXX_UID\": \"{}\"}}",
            self.time,
            self.water,
            self.wet,
            self.bs,
            self.pv,
            self.npv,
            self.geometry,
            self.uid
        )
    }
}

/// What the record layout expects at a column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    /// INT96 Julian-day timestamp.
    Int96Timestamp,
    /// DOUBLE.
    Double,
    /// UTF-8 text, annotated or a plain BYTE_ARRAY.
    Text,
}

impl ExpectedType {
    /// Whether a column of `physical` type can fill this slot.
    pub fn accepts(self, physical: PhysicalType) -> bool {
        match self {
            ExpectedType::Int96Timestamp => physical == PhysicalType::Int96,
            ExpectedType::Double => physical == PhysicalType::Double,
            ExpectedType::Text => {
                matches!(physical, PhysicalType::Utf8String | PhysicalType::ByteArray)
            }
        }
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpectedType::Int96Timestamp => "INT96",
            ExpectedType::Double => "DOUBLE",
            ExpectedType::Text => "UTF8",
        })
    }
}

/// Column layout of a WIT export, indexed by position.
pub const RECORD_LAYOUT: [ExpectedType; 8] = [
    ExpectedType::Int96Timestamp,
    ExpectedType::Double,
    ExpectedType::Double,
    ExpectedType::Double,
    ExpectedType::Double,
    ExpectedType::Double,
    ExpectedType::Text,
    ExpectedType::Text,
];

/// A row that does not fit [`RECORD_LAYOUT`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MaterializationError {
    /// Declared or observed type differs from the layout.
    #[snafu(display("Row {row}, column {position}: expected {expected}, found {observed}"))]
    TypeMismatch {
        /// Row index within its row group.
        row: usize,
        /// Column position.
        position: usize,
        /// Type required by the layout.
        expected: ExpectedType,
        /// Type declared by the schema or carried by the cell.
        observed: PhysicalType,
    },

    /// The schema has no column at the position, or the value is null.
    #[snafu(display("Row {row}, column {position}: value missing"))]
    MissingColumn {
        /// Row index within its row group.
        row: usize,
        /// Column position.
        position: usize,
    },
}

/// Discriminant of [`MaterializationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializationErrorKind {
    /// See [`MaterializationError::TypeMismatch`].
    TypeMismatch,
    /// See [`MaterializationError::MissingColumn`].
    MissingColumn,
}

impl MaterializationError {
    /// Which kind of failure this is.
    pub fn kind(&self) -> MaterializationErrorKind {
        match self {
            MaterializationError::TypeMismatch { .. } => MaterializationErrorKind::TypeMismatch,
            MaterializationError::MissingColumn { .. } => MaterializationErrorKind::MissingColumn,
        }
    }

    /// Column position that failed.
    pub fn position(&self) -> usize {
        match self {
            MaterializationError::TypeMismatch { position, .. }
            | MaterializationError::MissingColumn { position, .. } => *position,
        }
    }

    /// Row index (within its row group) that failed.
    pub fn row(&self) -> usize {
        match self {
            MaterializationError::TypeMismatch { row, .. }
            | MaterializationError::MissingColumn { row, .. } => *row,
        }
    }
}

/// Check the schema's declared types against [`RECORD_LAYOUT`].
pub fn check_layout(schema: &Schema, row: usize) -> Result<(), MaterializationError> {
    for (position, expected) in RECORD_LAYOUT.iter().copied().enumerate() {
        let field = schema
            .field(position)
            .context(MissingColumnSnafu { row, position })?;
        let observed = field.physical_type();
        ensure!(
            expected.accepts(observed),
            TypeMismatchSnafu {
                row,
                position,
                expected,
                observed,
            }
        );
    }
    Ok(())
}

/// Build the [`Record`] for `row` of `group`.
///
/// The schema is checked before any cell is read, so a layout mismatch fails
/// without touching the group's data.
pub fn materialize_row<G>(schema: &Schema, group: &mut G, row: usize) -> Result<Record, ReadError>
where
    G: RowGroup + ?Sized,
{
    check_layout(schema, row).context(MaterializeSnafu)?;
    read_row(group, row)
}

/// [`materialize_row`] without the layout check, for callers that already
/// validated the schema once.
pub(crate) fn read_row<G>(group: &mut G, row: usize) -> Result<Record, ReadError>
where
    G: RowGroup + ?Sized,
{
    let mut cells = RowCells { group, row };
    let time = cells.timestamp(0)?;
    let water = cells.double(1)?;
    let wet = cells.double(2)?;
    let bs = cells.double(3)?;
    let pv = cells.double(4)?;
    let npv = cells.double(5)?;
    let geometry = cells.text(6)?;
    let uid = cells.text(7)?;

    Ok(Record {
        time,
        water,
        wet,
        bs,
        pv,
        npv,
        geometry,
        uid,
    })
}

struct RowCells<'a, G: ?Sized> {
    group: &'a mut G,
    row: usize,
}

impl<G: RowGroup + ?Sized> RowCells<'_, G> {
    fn read(&mut self, position: usize) -> Result<Cell, ReadError> {
        let row = self.row;
        self.group
            .cell(row, position)
            .context(SourceSnafu)?
            .context(MissingColumnSnafu { row, position })
            .context(MaterializeSnafu)
    }

    fn mismatch(&self, position: usize, expected: ExpectedType, cell: &Cell) -> ReadError {
        let source = TypeMismatchSnafu {
            row: self.row,
            position,
            expected,
            observed: cell.physical_type(),
        }
        .build();
        ReadError::Materialize { source }
    }

    fn timestamp(&mut self, position: usize) -> Result<EpochTimestamp, ReadError> {
        match self.read(position)? {
            Cell::Int96(raw) => Ok(raw.to_epoch()),
            other => Err(self.mismatch(position, ExpectedType::Int96Timestamp, &other)),
        }
    }

    fn double(&mut self, position: usize) -> Result<f64, ReadError> {
        match self.read(position)? {
            Cell::Double(value) => Ok(value),
            other => Err(self.mismatch(position, ExpectedType::Double, &other)),
        }
    }

    fn text(&mut self, position: usize) -> Result<String, ReadError> {
        match self.read(position)? {
            Cell::Text(value) => Ok(value),
            other => Err(self.mismatch(position, ExpectedType::Text, &other)),
        }
    }
}
