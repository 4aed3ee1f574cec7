//! MemSQL (SingleStore) sink.
//!
//! - Backtick identifiers, bare table names quoted too
//! - Tables created as reference tables
//! - Timestamps with microsecond precision
//! - Column changes through `MODIFY COLUMN`

use super::ansi::IMPLICIT;
use super::{AlterColumnSyntax, Capability, Sink, TypeMapping};
use crate::models::DataType;

#[derive(Debug, Clone, Copy, Default)]
pub struct MemSqlSink;

const CAPABILITIES: &[Capability] = &[
    Capability::AddColumn,
    Capability::ImplicitDataTypeConversion,
    Capability::DataSizingChanges,
];

impl Sink for MemSqlSink {
    fn name(&self) -> &'static str {
        "memsql"
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

    fn data_type_name(&self, data_type: DataType) -> &'static str {
        match data_type {
            DataType::String => "VARCHAR",
            DataType::TimestampNtz => "DATETIME",
            DataType::Variant => "JSON",
            other => other.as_str(),
        }
    }

    fn timestamp_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S%.6f"
    }

    fn json_literal(&self, quoted: &str) -> String {
        quoted.to_string()
    }

    fn create_table_keyword(&self) -> &'static str {
        "CREATE REFERENCE TABLE"
    }

    fn alter_column_syntax(&self) -> AlterColumnSyntax {
        AlterColumnSyntax::ModifyColumn
    }

    fn implicit_mappings(&self) -> TypeMapping {
        IMPLICIT
    }
}
