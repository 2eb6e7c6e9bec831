//! Flat schema model for WIT parquet exports.
//!
//! A [`Schema`] is the ordered list of primitive [`FieldDescriptor`]s found at
//! the top level of the file's message type. All column access in this crate
//! is positional, so `fields()[i].position() == i` always holds and the list
//! is never re-sorted.
//!
//! Only flat schemas are supported: group fields (structs, lists, maps) and
//! REPEATED primitives are rejected with a [`SchemaError`] instead of being
//! flattened into leaf columns, which would shift every later position.

use std::fmt;

use parquet::basic::{ConvertedType, Repetition, Type as ParquetPhysicalType};
use parquet::schema::printer::print_schema;
use parquet::schema::types::{Type, TypePtr};
use snafu::prelude::*;

/// Physical encoding of a column as distinguished by this crate.
///
/// `BYTE_ARRAY` columns carrying the `UTF8` converted type (written alongside
/// the `String` logical type) are reported as [`PhysicalType::Utf8String`];
/// unannotated ones as [`PhysicalType::ByteArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    /// `BOOLEAN`.
    Boolean,
    /// `INT32`.
    Int32,
    /// `INT64`.
    Int64,
    /// `INT96`, used by legacy writers for Julian-day timestamps.
    Int96,
    /// `FLOAT` (32-bit).
    Float,
    /// `DOUBLE` (64-bit).
    Double,
    /// `BYTE_ARRAY` annotated as UTF-8 text.
    Utf8String,
    /// `BYTE_ARRAY` without a string annotation.
    ByteArray,
    /// `FIXED_LEN_BYTE_ARRAY` with its byte width.
    FixedLenByteArray(i32),
}

impl PhysicalType {
    pub(crate) fn from_parquet(
        physical: ParquetPhysicalType,
        converted: ConvertedType,
        type_length: i32,
    ) -> Self {
        match physical {
            ParquetPhysicalType::BOOLEAN => PhysicalType::Boolean,
            ParquetPhysicalType::INT32 => PhysicalType::Int32,
            ParquetPhysicalType::INT64 => PhysicalType::Int64,
            ParquetPhysicalType::INT96 => PhysicalType::Int96,
            ParquetPhysicalType::FLOAT => PhysicalType::Float,
            ParquetPhysicalType::DOUBLE => PhysicalType::Double,
            ParquetPhysicalType::BYTE_ARRAY if converted == ConvertedType::UTF8 => {
                PhysicalType::Utf8String
            }
            ParquetPhysicalType::BYTE_ARRAY => PhysicalType::ByteArray,
            ParquetPhysicalType::FIXED_LEN_BYTE_ARRAY => {
                PhysicalType::FixedLenByteArray(type_length)
            }
        }
    }

    /// The Parquet primitive type name, without annotations.
    pub fn parquet_name(self) -> &'static str {
        match self {
            PhysicalType::Boolean => "BOOLEAN",
            PhysicalType::Int32 => "INT32",
            PhysicalType::Int64 => "INT64",
            PhysicalType::Int96 => "INT96",
            PhysicalType::Float => "FLOAT",
            PhysicalType::Double => "DOUBLE",
            PhysicalType::Utf8String | PhysicalType::ByteArray => "BYTE_ARRAY",
            PhysicalType::FixedLenByteArray(_) => "FIXED_LEN_BYTE_ARRAY",
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalType::Utf8String => f.write_str("UTF8"),
            PhysicalType::FixedLenByteArray(width) => write!(f, "FIXED_LEN_BYTE_ARRAY({width})"),
            other => f.write_str(other.parquet_name()),
        }
    }
}

/// Errors raised while turning a Parquet message type into a flat [`Schema`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaError {
    /// The schema root is a primitive instead of a message (group) type.
    #[snafu(display("Schema root '{name}' is not a message type"))]
    RootNotGroup {
        /// Name of the offending root type.
        name: String,
    },

    /// A top-level field is a group type (struct, list or map).
    #[snafu(display(
        "Field '{name}' at position {position} is a group type; only flat primitive schemas are supported"
    ))]
    NestedField {
        /// Field name.
        name: String,
        /// Top-level position of the field.
        position: usize,
    },

    /// A top-level primitive field is REPEATED.
    #[snafu(display(
        "Field '{name}' at position {position} is REPEATED; only flat primitive schemas are supported"
    ))]
    RepeatedField {
        /// Field name.
        name: String,
        /// Top-level position of the field.
        position: usize,
    },
}

/// One primitive column of a flat schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    physical_type: PhysicalType,
    nullable: bool,
    position: usize,
}

impl FieldDescriptor {
    /// Column name as stored in the file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical encoding of the column.
    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    /// `true` for OPTIONAL columns.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Zero-based column position; equals the field's index in [`Schema::fields`].
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Ordered, immutable list of the top-level primitive fields of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDescriptor>,
    rendered: String,
}

impl Schema {
    /// Build a schema from `(name, physical type, nullable)` triples.
    ///
    /// Positions are assigned from iteration order. Meant for schemas that do
    /// not come from a file; [`parse_schema`] is the usual constructor.
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, PhysicalType, bool)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(position, (name, physical_type, nullable))| FieldDescriptor {
                name: name.into(),
                physical_type,
                nullable,
                position,
            })
            .collect::<Vec<_>>();
        let name = name.into();
        let rendered = render_fields(&name, &fields);

        Self {
            name,
            fields,
            rendered,
        }
    }

    /// Name of the message type (usually `schema`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in column order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Field at `position`, if the schema has that many columns.
    pub fn field(&self, position: usize) -> Option<&FieldDescriptor> {
        self.fields.get(position)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The message-type text, exactly as the `parquet` schema printer renders it
/// for file schemas.
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

fn render_message(root: &Type) -> String {
    let mut out = Vec::new();
    print_schema(&mut out, root);
    String::from_utf8_lossy(&out).trim_end().to_string()
}

// Same layout as the parquet printer, limited to what a descriptor knows.
fn render_fields(name: &str, fields: &[FieldDescriptor]) -> String {
    let mut out = format!("message {name} {{\n");
    for field in fields {
        let repetition = if field.nullable { "OPTIONAL" } else { "REQUIRED" };
        let physical = match field.physical_type {
            PhysicalType::FixedLenByteArray(width) => format!("FIXED_LEN_BYTE_ARRAY ({width})"),
            other => other.parquet_name().to_string(),
        };
        out.push_str(&format!("  {repetition} {physical} {}", field.name));
        if field.physical_type == PhysicalType::Utf8String {
            out.push_str(" (UTF8)");
        }
        out.push_str(";\n");
    }
    out.push('}');
    out
}

/// Parse the root message type of a Parquet file into a flat [`Schema`].
pub fn parse_schema(root: &Type) -> Result<Schema, SchemaError> {
    ensure!(
        root.is_group(),
        RootNotGroupSnafu {
            name: root.name()
        }
    );

    let fields = root
        .get_fields()
        .iter()
        .enumerate()
        .map(|(position, field)| field_descriptor(position, field))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Schema {
        name: root.name().to_string(),
        fields,
        rendered: render_message(root),
    })
}

fn field_descriptor(position: usize, field: &TypePtr) -> Result<FieldDescriptor, SchemaError> {
    let name = field.name();

    let (physical, type_length) = match field.as_ref() {
        Type::PrimitiveType {
            physical_type,
            type_length,
            ..
        } => (*physical_type, *type_length),
        Type::GroupType { .. } => return NestedFieldSnafu { name, position }.fail(),
    };

    let info = field.get_basic_info();
    let repetition = if info.has_repetition() {
        info.repetition()
    } else {
        Repetition::REQUIRED
    };
    ensure!(
        repetition != Repetition::REPEATED,
        RepeatedFieldSnafu { name, position }
    );

    Ok(FieldDescriptor {
        name: name.to_string(),
        physical_type: PhysicalType::from_parquet(physical, info.converted_type(), type_length),
        nullable: repetition == Repetition::OPTIONAL,
        position,
    })
}
