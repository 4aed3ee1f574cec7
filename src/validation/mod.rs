//! Validation functionality
//!
//! Provides validation logic for:
//! - Identifier validation and sanitization (security)
//! - Ingest mode validation against dataset schemas

pub mod ingest_mode;
pub mod input;

pub use ingest_mode::IngestModeValidator;
pub use input::{
    IdentifierError, IdentifierResult, validate_dataset, validate_datasets, validate_identifier,
};
