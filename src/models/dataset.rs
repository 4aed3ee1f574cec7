//! Dataset model: main, staging, metadata and temp tables

use serde::{Deserialize, Serialize};
use std::fmt;

use super::column::Column;
use super::enums::FilterType;

/// Default alias of the main dataset in generated predicates
pub const MAIN_ALIAS: &str = "sink";
/// Default alias of the staging dataset in generated predicates
pub const STAGING_ALIAS: &str = "stage";

/// A table taking part in ingestion
///
/// Qualified as `database.group.name` when rendered; both prefixes are optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Database (catalog) name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Group (schema) name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Table name
    pub name: String,
    /// Alias used inside generated SQL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Ordered list of columns
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Filters restricting which staging rows take part in a batch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<StagingFilter>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            group: None,
            name: name.into(),
            alias: None,
            columns: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn with_filter(mut self, filter: StagingFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Alias to use, falling back to `default` when none was given
    pub fn alias_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.alias.as_deref().unwrap_or(default)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Names of the primary key columns, in column order
    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Copy of this dataset under a different table name, keeping database and group
    pub fn renamed(&self, name: impl Into<String>, alias: impl Into<String>) -> Dataset {
        Dataset {
            database: self.database.clone(),
            group: self.group.clone(),
            name: name.into(),
            alias: Some(alias.into()),
            columns: self.columns.clone(),
            filters: Vec::new(),
        }
    }
}

/// Value compared against by a staging filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(v) => write!(f, "{}", v),
            FilterValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

/// A `(column, comparison, value)` restriction on staging rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StagingFilter {
    pub field: String,
    pub filter_type: FilterType,
    pub value: FilterValue,
}

impl StagingFilter {
    pub fn new(field: impl Into<String>, filter_type: FilterType, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            filter_type,
            value: value.into(),
        }
    }
}

/// Batch metadata table definition
///
/// Field names can be overridden for tables that predate this layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataDataset {
    pub database: Option<String>,
    pub group: Option<String>,
    pub name: String,
    pub table_name_field: String,
    pub batch_start_ts_field: String,
    pub batch_end_ts_field: String,
    pub batch_status_field: String,
    pub table_batch_id_field: String,
    pub staging_filters_field: String,
}

impl Default for MetadataDataset {
    fn default() -> Self {
        Self {
            database: None,
            group: None,
            name: "batch_metadata".to_string(),
            table_name_field: "table_name".to_string(),
            batch_start_ts_field: "batch_start_ts_utc".to_string(),
            batch_end_ts_field: "batch_end_ts_utc".to_string(),
            batch_status_field: "batch_status".to_string(),
            table_batch_id_field: "table_batch_id".to_string(),
            staging_filters_field: "staging_filters".to_string(),
        }
    }
}

/// The datasets a single ingestion works on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Datasets {
    pub main: Dataset,
    pub staging: Dataset,
    #[serde(default)]
    pub metadata: MetadataDataset,
    /// Name of the temp table used by bitemporal ingestion when only the start of validity is supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_name: Option<String>,
    /// Name of the temp table holding delete-marked rows for the same flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_with_delete_indicator_name: Option<String>,
}

impl Datasets {
    pub fn new(main: Dataset, staging: Dataset) -> Self {
        Self {
            main,
            staging,
            metadata: MetadataDataset::default(),
            temp_name: None,
            temp_with_delete_indicator_name: None,
        }
    }

    pub fn with_metadata(mut self, metadata: MetadataDataset) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_temp_name(mut self, name: impl Into<String>) -> Self {
        self.temp_name = Some(name.into());
        self
    }

    pub fn with_temp_with_delete_indicator_name(mut self, name: impl Into<String>) -> Self {
        self.temp_with_delete_indicator_name = Some(name.into());
        self
    }
}

/// Closed interval over the data split column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSplitRange {
    pub lower: i64,
    pub upper: i64,
}

impl DataSplitRange {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }
}
