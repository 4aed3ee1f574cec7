//! SQL sinks (dialects)
//!
//! A [`Sink`] declares how identifiers are quoted, how types and functions
//! are named, and which capabilities a target database has. Sinks are unit
//! structs; [`SinkKind`] selects one by name.
//!
//! Supported sinks:
//! - ANSI SQL (`ansi`)
//! - H2 (`h2`)
//! - MemSQL / SingleStore (`memsql`)
//! - Google BigQuery (`bigquery`)
//! - Snowflake (`snowflake`)

pub mod ansi;
pub mod bigquery;
pub mod h2;
pub mod memsql;
pub mod snowflake;

pub use ansi::AnsiSink;
pub use bigquery::BigQuerySink;
pub use h2::H2Sink;
pub use memsql::MemSqlSink;
pub use snowflake::SnowflakeSink;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::logical_plan::FunctionName;
use crate::models::DataType;

/// Optional features a sink may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `MERGE INTO ... USING ...`
    Merge,
    /// `ALTER TABLE ... ADD COLUMN`
    AddColumn,
    /// The database converts between compatible types without an ALTER
    ImplicitDataTypeConversion,
    /// Column types can be changed with an ALTER
    ExplicitDataTypeConversion,
    /// Column length and scale can be changed with an ALTER
    DataSizingChanges,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Merge => "MERGE",
            Capability::AddColumn => "ADD_COLUMN",
            Capability::ImplicitDataTypeConversion => "IMPLICIT_DATA_TYPE_CONVERSION",
            Capability::ExplicitDataTypeConversion => "EXPLICIT_DATA_TYPE_CONVERSION",
            Capability::DataSizingChanges => "DATA_SIZING_CHANGES",
        };
        f.write_str(s)
    }
}

/// Syntax used to change an existing column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterColumnSyntax {
    /// `ALTER COLUMN "c" TYPE` / `ALTER COLUMN "c" DROP NOT NULL`
    AlterColumn,
    /// `MODIFY COLUMN "c" TYPE`
    ModifyColumn,
    /// `ALTER COLUMN "c" SET DATA TYPE TYPE`
    SetDataType,
}

/// Type conversions keyed by the resulting type
///
/// Each entry reads "a column of the first type accepts values of any of the listed types".
pub type TypeMapping = &'static [(DataType, &'static [DataType])];

pub(crate) const NUMERIC_SOURCES: &[DataType] = &[
    DataType::Tinyint,
    DataType::Smallint,
    DataType::Integer,
    DataType::Int,
    DataType::Bigint,
    DataType::Float,
    DataType::Double,
    DataType::Real,
    DataType::Numeric,
    DataType::Decimal,
];

pub(crate) fn mapping_contains(mapping: TypeMapping, target: DataType, source: DataType) -> bool {
    mapping
        .iter()
        .any(|(t, sources)| *t == target && sources.contains(&source))
}

/// A target SQL dialect
pub trait Sink: fmt::Debug + Send + Sync {
    /// Sink name used in errors and logs
    fn name(&self) -> &'static str;

    /// Character used to quote identifiers
    fn quote_char(&self) -> char {
        '"'
    }

    /// Whether a table name with no database or group prefix is quoted
    fn quote_bare_table_names(&self) -> bool {
        false
    }

    fn capabilities(&self) -> &'static [Capability];

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Name of `function` in this dialect, or `None` if it has no equivalent
    fn function_name(&self, function: FunctionName) -> Option<&'static str> {
        Some(function.ansi_name())
    }

    fn data_type_name(&self, data_type: DataType) -> &'static str {
        data_type.as_str()
    }

    /// chrono format of timestamp literals
    fn timestamp_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    /// Render a timestamp literal from its formatted text
    fn timestamp_literal(&self, text: &str) -> String {
        format!("'{}'", text)
    }

    /// Render a JSON document from its single-quoted text
    fn json_literal(&self, quoted: &str) -> String {
        format!("PARSE_JSON({})", quoted)
    }

    fn create_table_keyword(&self) -> &'static str {
        "CREATE TABLE"
    }

    /// Text appended after the PRIMARY KEY column list
    fn primary_key_suffix(&self) -> &'static str {
        ""
    }

    fn alter_column_syntax(&self) -> AlterColumnSyntax {
        AlterColumnSyntax::AlterColumn
    }

    /// Conversions the database performs without an ALTER
    fn implicit_mappings(&self) -> TypeMapping {
        &[]
    }

    /// Conversions that require an ALTER of the column type
    fn explicit_mappings(&self) -> TypeMapping {
        &[]
    }

    /// Whether a `main` column can hold `staging` values without changing type
    fn supports_implicit_mapping(&self, main: DataType, staging: DataType) -> bool {
        mapping_contains(self.implicit_mappings(), main, staging)
    }

    /// Whether a `main` column can be altered to the `staging` type
    fn supports_explicit_mapping(&self, main: DataType, staging: DataType) -> bool {
        mapping_contains(self.explicit_mappings(), staging, main)
    }
}

/// Selects a sink by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Ansi,
    H2,
    Memsql,
    Bigquery,
    Snowflake,
}

static ANSI: AnsiSink = AnsiSink;
static H2: H2Sink = H2Sink;
static MEMSQL: MemSqlSink = MemSqlSink;
static BIGQUERY: BigQuerySink = BigQuerySink;
static SNOWFLAKE: SnowflakeSink = SnowflakeSink;

impl SinkKind {
    pub fn sink(&self) -> &'static dyn Sink {
        match self {
            SinkKind::Ansi => &ANSI,
            SinkKind::H2 => &H2,
            SinkKind::Memsql => &MEMSQL,
            SinkKind::Bigquery => &BIGQUERY,
            SinkKind::Snowflake => &SNOWFLAKE,
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Ansi => write!(f, "ansi"),
            SinkKind::H2 => write!(f, "h2"),
            SinkKind::Memsql => write!(f, "memsql"),
            SinkKind::Bigquery => write!(f, "bigquery"),
            SinkKind::Snowflake => write!(f, "snowflake"),
        }
    }
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ansi" => Ok(SinkKind::Ansi),
            "h2" => Ok(SinkKind::H2),
            "memsql" | "singlestore" => Ok(SinkKind::Memsql),
            "bigquery" => Ok(SinkKind::Bigquery),
            "snowflake" => Ok(SinkKind::Snowflake),
            _ => Err(format!("Unknown sink: {}", s)),
        }
    }
}
