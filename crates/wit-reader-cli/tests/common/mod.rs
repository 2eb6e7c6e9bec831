use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::basic::{ConvertedType, Repetition, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::{ByteArray, Int96};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::{Type, TypePtr};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

const JULIAN_DAY_OF_UNIX_EPOCH: u32 = 2_440_588;
const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Values of one column within one row group; `None` is written as null.
pub enum ColumnValues {
    Int96(Vec<Option<Int96>>),
    Double(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

pub struct FixtureRow {
    pub julian_day: u32,
    pub nanos_of_day: u64,
    pub fractions: [f64; 5],
    pub geometry: String,
    pub uid: Option<String>,
}

fn int96(julian_day: u32, nanos_of_day: u64) -> Int96 {
    Int96::from(vec![
        nanos_of_day as u32,
        (nanos_of_day >> 32) as u32,
        julian_day,
    ])
}

/// Row `n`: day `n` after the epoch, `n` seconds into the day.
pub fn fixture_row(n: usize) -> FixtureRow {
    FixtureRow {
        julian_day: JULIAN_DAY_OF_UNIX_EPOCH + n as u32,
        nanos_of_day: n as u64 * NANOS_PER_SECOND,
        fractions: [
            n as f64,
            n as f64 + 0.5,
            0.25,
            0.125,
            1.0 / (n as f64 + 1.0),
        ],
        geometry: format!("POINT ({n} {n})"),
        uid: Some(format!("uid-{n}")),
    }
}

fn optional(name: &str, physical: PhysicalType) -> TestResult<TypePtr> {
    Ok(Arc::new(
        Type::primitive_type_builder(name, physical)
            .with_repetition(Repetition::OPTIONAL)
            .build()?,
    ))
}

fn optional_utf8(name: &str) -> TestResult<TypePtr> {
    Ok(Arc::new(
        Type::primitive_type_builder(name, PhysicalType::BYTE_ARRAY)
            .with_repetition(Repetition::OPTIONAL)
            .with_converted_type(ConvertedType::UTF8)
            .build()?,
    ))
}

/// The column layout of a WIT export.
pub fn wit_fields() -> TestResult<Vec<TypePtr>> {
    Ok(vec![
        optional("time", PhysicalType::INT96)?,
        optional("water", PhysicalType::DOUBLE)?,
        optional("wet", PhysicalType::DOUBLE)?,
        optional("bs", PhysicalType::DOUBLE)?,
        optional("pv", PhysicalType::DOUBLE)?,
        optional("npv", PhysicalType::DOUBLE)?,
        optional_utf8("geometry")?,
        optional_utf8("uid")?,
    ])
}

pub fn wit_group(rows: &[FixtureRow]) -> Vec<ColumnValues> {
    let mut columns = vec![ColumnValues::Int96(
        rows.iter()
            .map(|r| Some(int96(r.julian_day, r.nanos_of_day)))
            .collect(),
    )];
    for i in 0..5 {
        columns.push(ColumnValues::Double(
            rows.iter().map(|r| Some(r.fractions[i])).collect(),
        ));
    }
    columns.push(ColumnValues::Text(
        rows.iter().map(|r| Some(r.geometry.clone())).collect(),
    ));
    columns.push(ColumnValues::Text(rows.iter().map(|r| r.uid.clone()).collect()));
    columns
}

/// Write a parquet file with one row group per entry of `groups`.
pub fn write_parquet(
    path: &Path,
    fields: Vec<TypePtr>,
    groups: Vec<Vec<ColumnValues>>,
) -> TestResult {
    let schema = Arc::new(
        Type::group_type_builder("schema")
            .with_fields(fields)
            .build()?,
    );
    let file = File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = SerializedFileWriter::new(file, schema, Arc::new(props))?;

    for group in groups {
        let mut row_group_writer = writer.next_row_group()?;
        let mut columns = group.into_iter();
        while let Some(mut col_writer) = row_group_writer.next_column()? {
            let values = columns.next().ok_or("missing column values")?;
            match (col_writer.untyped(), values) {
                (ColumnWriter::Int96ColumnWriter(typed), ColumnValues::Int96(v)) => {
                    let (values, levels) = split_nulls(v);
                    typed.write_batch(&values, Some(&levels), None)?;
                }
                (ColumnWriter::DoubleColumnWriter(typed), ColumnValues::Double(v)) => {
                    let (values, levels) = split_nulls(v);
                    typed.write_batch(&values, Some(&levels), None)?;
                }
                (ColumnWriter::ByteArrayColumnWriter(typed), ColumnValues::Text(v)) => {
                    let (values, levels) = split_nulls(v);
                    let values: Vec<ByteArray> =
                        values.into_iter().map(|s| ByteArray::from(s.into_bytes())).collect();
                    typed.write_batch(&values, Some(&levels), None)?;
                }
                _ => return Err("unexpected column writer type".into()),
            }
            col_writer.close()?;
        }
        row_group_writer.close()?;
    }
    writer.close()?;
    Ok(())
}

fn split_nulls<T>(values: Vec<Option<T>>) -> (Vec<T>, Vec<i16>) {
    let mut present = Vec::with_capacity(values.len());
    let mut levels = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Some(v) => {
                present.push(v);
                levels.push(1);
            }
            None => levels.push(0),
        }
    }
    (present, levels)
}

/// A WIT file with one row group per entry of `group_sizes`, rows numbered
/// consecutively from 0.
pub fn write_wit_file(path: &Path, group_sizes: &[usize]) -> TestResult {
    let mut next = 0;
    let groups = group_sizes
        .iter()
        .map(|&size| {
            let rows: Vec<_> = (next..next + size).map(fixture_row).collect();
            next += size;
            wit_group(&rows)
        })
        .collect();
    write_parquet(path, wit_fields()?, groups)
}
