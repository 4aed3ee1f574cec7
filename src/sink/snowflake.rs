//! Snowflake sink.
//!
//! Snowflake features:
//! - ANSI identifier quoting (`"`)
//! - MERGE support
//! - VARIANT type for semi-structured data
//! - TIMESTAMP_NTZ for zone-less timestamps

use super::{AlterColumnSyntax, Capability, NUMERIC_SOURCES, Sink, TypeMapping};
use crate::models::DataType;

#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeSink;

const CAPABILITIES: &[Capability] = &[
    Capability::Merge,
    Capability::AddColumn,
    Capability::ImplicitDataTypeConversion,
    Capability::DataSizingChanges,
];

const IMPLICIT: TypeMapping = &[
    (DataType::Decimal, NUMERIC_SOURCES),
    (DataType::Numeric, NUMERIC_SOURCES),
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
    (
        DataType::Varchar,
        &[DataType::Char, DataType::String, DataType::Text],
    ),
    (DataType::Timestamp, &[DataType::Datetime]),
    (DataType::Json, &[DataType::Variant]),
];

impl Sink for SnowflakeSink {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn data_type_name(&self, data_type: DataType) -> &'static str {
        match data_type {
            DataType::Datetime | DataType::TimestampNtz => "TIMESTAMP_NTZ",
            DataType::Json | DataType::Variant => "VARIANT",
            other => other.as_str(),
        }
    }

    fn alter_column_syntax(&self) -> AlterColumnSyntax {
        AlterColumnSyntax::SetDataType
    }

    fn implicit_mappings(&self) -> TypeMapping {
        IMPLICIT
    }
}
