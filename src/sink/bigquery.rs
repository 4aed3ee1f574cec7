//! Google BigQuery sink.
//!
//! BigQuery features:
//! - Backtick identifiers, bare table names quoted too
//! - MERGE support
//! - `INT64`/`FLOAT64`/`STRING`/`BOOL` type names
//! - Timestamps parsed with `PARSE_DATETIME`
//! - Primary keys are `NOT ENFORCED`

use super::{AlterColumnSyntax, Capability, NUMERIC_SOURCES, Sink, TypeMapping};
use crate::logical_plan::FunctionName;
use crate::models::DataType;

#[derive(Debug, Clone, Copy, Default)]
pub struct BigQuerySink;

const CAPABILITIES: &[Capability] = &[
    Capability::Merge,
    Capability::AddColumn,
    Capability::ImplicitDataTypeConversion,
];

const IMPLICIT: TypeMapping = &[
    (DataType::Numeric, NUMERIC_SOURCES),
    (DataType::Decimal, NUMERIC_SOURCES),
    (
        DataType::Double,
        &[
            DataType::Tinyint,
            DataType::Smallint,
            DataType::Integer,
            DataType::Int,
            DataType::Bigint,
            DataType::Float,
            DataType::Real,
            DataType::Numeric,
            DataType::Decimal,
        ],
    ),
    (
        DataType::Float,
        &[
            DataType::Tinyint,
            DataType::Smallint,
            DataType::Integer,
            DataType::Int,
            DataType::Bigint,
            DataType::Double,
            DataType::Real,
            DataType::Numeric,
            DataType::Decimal,
        ],
    ),
    (
        DataType::Integer,
        &[
            DataType::Int,
            DataType::Bigint,
            DataType::Tinyint,
            DataType::Smallint,
        ],
    ),
    (
        DataType::Bigint,
        &[
            DataType::Int,
            DataType::Integer,
            DataType::Tinyint,
            DataType::Smallint,
        ],
    ),
    (
        DataType::String,
        &[DataType::Char, DataType::Varchar, DataType::Text],
    ),
    (
        DataType::Varchar,
        &[DataType::Char, DataType::String, DataType::Text],
    ),
    (DataType::Datetime, &[DataType::TimestampNtz]),
];

impl Sink for BigQuerySink {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn quote_bare_table_names(&self) -> bool {
        true
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn function_name(&self, function: FunctionName) -> Option<&'static str> {
        match function {
            FunctionName::CurrentTimestamp => Some("CURRENT_DATETIME"),
            other => Some(other.ansi_name()),
        }
    }

    fn data_type_name(&self, data_type: DataType) -> &'static str {
        match data_type {
            DataType::Int
            | DataType::Integer
            | DataType::Bigint
            | DataType::Tinyint
            | DataType::Smallint => "INT64",
            DataType::Numeric | DataType::Decimal => "NUMERIC",
            DataType::Float | DataType::Double | DataType::Real => "FLOAT64",
            DataType::Char | DataType::Varchar | DataType::String | DataType::Text => "STRING",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Datetime | DataType::TimestampNtz => "DATETIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Boolean => "BOOL",
            DataType::Json | DataType::Variant => "JSON",
        }
    }

    fn timestamp_literal(&self, text: &str) -> String {
        format!("PARSE_DATETIME('%Y-%m-%d %H:%M:%S','{}')", text)
    }

    fn primary_key_suffix(&self) -> &'static str {
        " NOT ENFORCED"
    }

    fn alter_column_syntax(&self) -> AlterColumnSyntax {
        AlterColumnSyntax::SetDataType
    }

    fn implicit_mappings(&self) -> TypeMapping {
        IMPLICIT
    }
}
