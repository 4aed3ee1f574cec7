//! Identifier validation for dataset, column and alias names.
//!
//! Identifiers are quoted when rendered, but a quote character or statement
//! separator inside a name would still break out of the generated SQL, so
//! every name is checked before planning.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{Dataset, Datasets};

/// Maximum length for any identifier
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

static RE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$\-]*$").expect("Invalid regex"));

/// Errors that can occur during identifier validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input is empty when a value is required
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Input contains characters that cannot appear in an identifier
    #[error("{field} '{value}' contains invalid characters")]
    InvalidCharacters { field: &'static str, value: String },
}

/// Result type for identifier validation.
pub type IdentifierResult<T> = Result<T, IdentifierError>;

/// Validate a single identifier.
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 255 characters
/// - Must start with a letter or underscore
/// - May contain letters, digits, underscores, hyphens and `$`
///
/// # Examples
///
/// ```
/// use ingest_planner::validation::input::validate_identifier;
///
/// assert!(validate_identifier("table name", "main").is_ok());
/// assert!(validate_identifier("table name", "batch_metadata").is_ok());
/// assert!(validate_identifier("table name", "").is_err());
/// assert!(validate_identifier("column name", "id\"; DROP TABLE x").is_err());
/// ```
pub fn validate_identifier(field: &'static str, name: &str) -> IdentifierResult<()> {
    if name.is_empty() {
        return Err(IdentifierError::Empty(field));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong {
            field,
            max: MAX_IDENTIFIER_LENGTH,
            actual: name.len(),
        });
    }

    if !RE_IDENTIFIER.is_match(name) {
        return Err(IdentifierError::InvalidCharacters {
            field,
            value: name.to_string(),
        });
    }

    Ok(())
}

/// Validate the table, alias and column names of a dataset.
pub fn validate_dataset(dataset: &Dataset) -> IdentifierResult<()> {
    if let Some(database) = &dataset.database {
        validate_identifier("database name", database)?;
    }
    if let Some(group) = &dataset.group {
        validate_identifier("group name", group)?;
    }
    validate_identifier("table name", &dataset.name)?;
    if let Some(alias) = &dataset.alias {
        validate_identifier("alias", alias)?;
    }
    for column in &dataset.columns {
        validate_identifier("column name", &column.name)?;
    }
    for filter in &dataset.filters {
        validate_identifier("filter field", &filter.field)?;
    }
    Ok(())
}

/// Validate every identifier used by an ingestion.
pub fn validate_datasets(datasets: &Datasets) -> IdentifierResult<()> {
    validate_dataset(&datasets.main)?;
    validate_dataset(&datasets.staging)?;
    validate_identifier("metadata table name", &datasets.metadata.name)?;
    if let Some(name) = &datasets.temp_name {
        validate_identifier("temp table name", name)?;
    }
    if let Some(name) = &datasets.temp_with_delete_indicator_name {
        validate_identifier("temp table name", name)?;
    }
    Ok(())
}
