//! Column model for datasets

use serde::{Deserialize, Serialize};

use super::enums::DataType;

/// Column model representing a field in a dataset
///
/// A column has a semantic type, an optional length and scale, and
/// primary-key and nullability flags. Primary key columns are never nullable.
///
/// # Example
///
/// ```rust
/// use ingest_planner::models::{Column, DataType};
///
/// let id = Column::new("id", DataType::Integer).primary_key();
/// let name = Column::new("name", DataType::Varchar).with_length(64);
/// assert!(!id.is_nullable());
/// assert_eq!(name.length, Some(64));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name
    pub name: String,
    /// Semantic data type
    pub data_type: DataType,
    /// Length or precision (e.g. VARCHAR(64), DECIMAL(10, 2))
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Scale for decimal types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Whether this column is part of the primary key (default: false)
    #[serde(default)]
    pub primary_key: bool,
    /// Whether the column allows NULL values (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,
}

fn default_true() -> bool {
    true
}

impl Column {
    /// Create a nullable, non-key column
    ///
    /// # Arguments
    ///
    /// * `name` - The column name
    /// * `data_type` - The semantic type of the column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            length: None,
            scale: None,
            primary_key: false,
            nullable: true,
        }
    }

    /// Mark the column as part of the primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Whether NULL values are allowed, taking the primary key flag into account
    pub fn is_nullable(&self) -> bool {
        self.nullable && !self.primary_key
    }

    /// Whether type, length and scale are identical
    pub fn same_type(&self, other: &Column) -> bool {
        self.data_type == other.data_type && self.length == other.length && self.scale == other.scale
    }
}
