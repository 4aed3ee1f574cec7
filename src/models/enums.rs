//! Enums shared across the dataset and ingest mode models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic column type
///
/// Sinks map these onto their own type names when rendering DDL; see
/// [`crate::sink::Sink::data_type_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Int,
    Integer,
    Bigint,
    Tinyint,
    Smallint,
    Numeric,
    Decimal,
    Float,
    Double,
    Real,
    Char,
    Varchar,
    String,
    Text,
    Date,
    Time,
    Datetime,
    Timestamp,
    TimestampNtz,
    Boolean,
    Json,
    Variant,
}

impl DataType {
    /// All supported data types
    pub const ALL: [DataType; 22] = [
        DataType::Int,
        DataType::Integer,
        DataType::Bigint,
        DataType::Tinyint,
        DataType::Smallint,
        DataType::Numeric,
        DataType::Decimal,
        DataType::Float,
        DataType::Double,
        DataType::Real,
        DataType::Char,
        DataType::Varchar,
        DataType::String,
        DataType::Text,
        DataType::Date,
        DataType::Time,
        DataType::Datetime,
        DataType::Timestamp,
        DataType::TimestampNtz,
        DataType::Boolean,
        DataType::Json,
        DataType::Variant,
    ];

    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int => "INT",
            DataType::Integer => "INTEGER",
            DataType::Bigint => "BIGINT",
            DataType::Tinyint => "TINYINT",
            DataType::Smallint => "SMALLINT",
            DataType::Numeric => "NUMERIC",
            DataType::Decimal => "DECIMAL",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Real => "REAL",
            DataType::Char => "CHAR",
            DataType::Varchar => "VARCHAR",
            DataType::String => "STRING",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Datetime => "DATETIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::TimestampNtz => "TIMESTAMP_NTZ",
            DataType::Boolean => "BOOLEAN",
            DataType::Json => "JSON",
            DataType::Variant => "VARIANT",
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataType::Int
                | DataType::Integer
                | DataType::Bigint
                | DataType::Tinyint
                | DataType::Smallint
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                DataType::Numeric
                    | DataType::Decimal
                    | DataType::Float
                    | DataType::Double
                    | DataType::Real
            )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        DataType::ALL
            .iter()
            .find(|t| t.as_str() == upper)
            .copied()
            .ok_or_else(|| format!("Unknown data type: {}", s))
    }
}

/// Transform applied to every identifier before it is quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseConversion {
    #[default]
    None,
    ToUpper,
    ToLower,
}

impl CaseConversion {
    pub fn apply(&self, identifier: &str) -> String {
        match self {
            CaseConversion::None => identifier.to_string(),
            CaseConversion::ToUpper => identifier.to_uppercase(),
            CaseConversion::ToLower => identifier.to_lowercase(),
        }
    }
}

impl fmt::Display for CaseConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseConversion::None => write!(f, "none"),
            CaseConversion::ToUpper => write!(f, "to_upper"),
            CaseConversion::ToLower => write!(f, "to_lower"),
        }
    }
}

impl FromStr for CaseConversion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(CaseConversion::None),
            "to_upper" | "upper" => Ok(CaseConversion::ToUpper),
            "to_lower" | "lower" => Ok(CaseConversion::ToLower),
            _ => Err(format!("Unknown case conversion: {}", s)),
        }
    }
}

/// Comparison applied by a staging filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterType {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterType::Gt => "GT",
            FilterType::Gte => "GTE",
            FilterType::Lt => "LT",
            FilterType::Lte => "LTE",
            FilterType::Eq => "EQ",
            FilterType::Ne => "NE",
        };
        f.write_str(s)
    }
}

/// Names of the statistics queries a generator can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatisticName {
    IncomingRecordCount,
    RowsInserted,
    RowsUpdated,
    RowsDeleted,
    RowsTerminated,
}

impl StatisticName {
    /// Column alias used for the statistic in its SELECT
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticName::IncomingRecordCount => "incomingRecordCount",
            StatisticName::RowsInserted => "rowsInserted",
            StatisticName::RowsUpdated => "rowsUpdated",
            StatisticName::RowsDeleted => "rowsDeleted",
            StatisticName::RowsTerminated => "rowsTerminated",
        }
    }
}

impl fmt::Display for StatisticName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_parse_is_case_insensitive() {
        assert_eq!("varchar".parse::<DataType>().unwrap(), DataType::Varchar);
        assert_eq!(
            "timestamp_ntz".parse::<DataType>().unwrap(),
            DataType::TimestampNtz
        );
        assert!("BLOB".parse::<DataType>().is_err());
    }

    #[test]
    fn test_case_conversion_apply() {
        assert_eq!(CaseConversion::ToUpper.apply("main"), "MAIN");
        assert_eq!(CaseConversion::ToLower.apply("Main"), "main");
        assert_eq!(CaseConversion::None.apply("Main"), "Main");
    }

    #[test]
    fn test_data_type_serde_names() {
        let json = serde_json::to_string(&DataType::TimestampNtz).unwrap();
        assert_eq!(json, "\"TIMESTAMP_NTZ\"");
        let parsed: DataType = serde_json::from_str("\"VARCHAR\"").unwrap();
        assert_eq!(parsed, DataType::Varchar);
    }
}
