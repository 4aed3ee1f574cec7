//! Error types for planning and rendering ingestion SQL
//!
//! Each phase has its own error type:
//! - [`ConfigurationError`] is returned by builders when a strategy is constructed
//! - [`SchemaError`] is returned when an ingest mode is checked against datasets
//! - [`UnsupportedOperationError`] is returned when a sink cannot express an operation
//!
//! [`IngestError`] wraps all of them for callers that drive the whole pipeline.

use crate::validation::input::IdentifierError;

/// Error raised while building an ingest mode or one of its strategies
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Cannot build {type_name}, some of required attributes are not set [{}]", .attributes.join(", "))]
    MissingAttributes {
        type_name: &'static str,
        attributes: Vec<&'static str>,
    },
    #[error("Cannot build {type_name}, [{attribute}] must contain at least one element")]
    EmptyCollection {
        type_name: &'static str,
        attribute: &'static str,
    },
    #[error("{0}")]
    Invalid(String),
}

impl ConfigurationError {
    /// Collect the names of unset attributes and fail if any are missing
    pub(crate) fn check_required(
        type_name: &'static str,
        attributes: &[(&'static str, bool)],
    ) -> Result<(), ConfigurationError> {
        let missing: Vec<&'static str> = attributes
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::MissingAttributes {
                type_name,
                attributes: missing,
            })
        }
    }
}

/// Error raised when an ingest mode does not fit the datasets it is applied to
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Field \"{0}\" must be a primary key")]
    NotPrimaryKey(String),
    #[error("Field \"{0}\" does not exist")]
    FieldNotFound(String),
    #[error("Primary key list must not be empty")]
    EmptyPrimaryKeys,
    #[error("{kind} [{field}] not found in staging dataset")]
    MissingInStaging { kind: &'static str, field: String },
    #[error("Field \"{0}\" in staging dataset does not exist in main dataset")]
    StagingFieldMissingInMain(String),
    #[error("Breaking schema change from datatype {from} to {to}")]
    BreakingChange { from: String, to: String },
    #[error("Non-nullable field \"{0}\" does not exist in staging dataset")]
    NonNullableFieldMissing(String),
}

/// Error raised when the target sink cannot render an operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedOperationError {
    #[error("Capability {capability} is not supported by sink {sink}")]
    Capability {
        sink: &'static str,
        capability: String,
    },
    #[error("Function {function} is not supported by sink {sink}")]
    Function {
        sink: &'static str,
        function: String,
    },
    #[error("Operation {operation} is not supported by sink {sink}")]
    Operation {
        sink: &'static str,
        operation: String,
    },
}

/// Top-level error for the generator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperationError),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}
