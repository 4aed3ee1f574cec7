//! ANSI SQL sink.
//!
//! - Double-quoted identifiers, bare table names left unquoted
//! - No MERGE; upserts are rendered as UPDATE + INSERT
//! - Column type changes through `ALTER COLUMN`

use super::{Capability, NUMERIC_SOURCES, Sink, TypeMapping};
use crate::models::DataType;

/// ANSI SQL sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiSink;

const CAPABILITIES: &[Capability] = &[
    Capability::AddColumn,
    Capability::ImplicitDataTypeConversion,
    Capability::ExplicitDataTypeConversion,
    Capability::DataSizingChanges,
];

pub(crate) const IMPLICIT: TypeMapping = &[
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
    (
        DataType::Int,
        &[DataType::Integer, DataType::Tinyint, DataType::Smallint],
    ),
    (DataType::Smallint, &[DataType::Tinyint]),
    (DataType::Varchar, &[DataType::Char, DataType::String]),
    (DataType::String, &[DataType::Char, DataType::Varchar]),
    (DataType::Timestamp, &[DataType::Datetime]),
    (DataType::Datetime, &[DataType::Timestamp]),
];

pub(crate) const EXPLICIT: TypeMapping = &[
    (
        DataType::Bigint,
        &[
            DataType::Tinyint,
            DataType::Smallint,
            DataType::Integer,
            DataType::Int,
        ],
    ),
    (DataType::Integer, &[DataType::Tinyint, DataType::Smallint]),
    (DataType::Int, &[DataType::Tinyint, DataType::Smallint]),
    (DataType::Smallint, &[DataType::Tinyint]),
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
        ],
    ),
    (
        DataType::Decimal,
        &[
            DataType::Tinyint,
            DataType::Smallint,
            DataType::Integer,
            DataType::Int,
            DataType::Bigint,
        ],
    ),
    (DataType::Varchar, &[DataType::Char]),
    (DataType::Datetime, &[DataType::Date]),
    (DataType::Timestamp, &[DataType::Date]),
];

impl Sink for AnsiSink {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn implicit_mappings(&self) -> TypeMapping {
        IMPLICIT
    }

    fn explicit_mappings(&self) -> TypeMapping {
        EXPLICIT
    }
}
