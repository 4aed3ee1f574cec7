//! H2 sink.
//!
//! ANSI quoting with MERGE support. DATETIME is stored as TIMESTAMP and JSON
//! literals use the `FORMAT JSON` suffix.

use super::ansi::EXPLICIT;
use super::{Capability, NUMERIC_SOURCES, Sink, TypeMapping};
use crate::models::DataType;

#[derive(Debug, Clone, Copy, Default)]
pub struct H2Sink;

const CAPABILITIES: &[Capability] = &[
    Capability::Merge,
    Capability::AddColumn,
    Capability::ImplicitDataTypeConversion,
    Capability::ExplicitDataTypeConversion,
    Capability::DataSizingChanges,
];

const IMPLICIT: TypeMapping = &[
    (DataType::Decimal, NUMERIC_SOURCES),
    (
        DataType::Double,
        &[
            DataType::Tinyint,
            DataType::Smallint,
            DataType::Integer,
            DataType::Int,
            DataType::Float,
            DataType::Real,
        ],
    ),
    (
        DataType::Bigint,
        &[
            DataType::Tinyint,
            DataType::Smallint,
            DataType::Integer,
            DataType::Int,
        ],
    ),
    (
        DataType::Integer,
        &[DataType::Int, DataType::Tinyint, DataType::Smallint],
    ),
    (DataType::Smallint, &[DataType::Tinyint]),
    (DataType::Varchar, &[DataType::Char, DataType::String]),
    (DataType::Timestamp, &[DataType::Datetime]),
];

impl Sink for H2Sink {
    fn name(&self) -> &'static str {
        "h2"
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn data_type_name(&self, data_type: DataType) -> &'static str {
        match data_type {
            DataType::Datetime | DataType::TimestampNtz => "TIMESTAMP",
            DataType::String | DataType::Text => "VARCHAR",
            DataType::Variant => "JSON",
            other => other.as_str(),
        }
    }

    fn json_literal(&self, quoted: &str) -> String {
        format!("{} FORMAT JSON", quoted)
    }

    fn implicit_mappings(&self) -> TypeMapping {
        IMPLICIT
    }

    fn explicit_mappings(&self) -> TypeMapping {
        EXPLICIT
    }
}
