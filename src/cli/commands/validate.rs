//! Validate command implementation

use super::load_job;
use crate::cli::error::CliError;
use crate::error::IngestError;
use crate::validation::{IngestModeValidator, validate_datasets};

/// Handle the validate command
pub fn handle_validate(input: &str) -> Result<(), CliError> {
    validate(input)?;
    println!("Validation successful");
    Ok(())
}

/// Check identifiers and that the ingest mode fits the job's datasets
pub fn validate(input: &str) -> Result<(), CliError> {
    let job = load_job(input)?;
    let datasets = job.datasets();
    validate_datasets(&datasets).map_err(IngestError::from)?;
    IngestModeValidator::new()
        .validate(&job.ingest_mode, &datasets)
        .map_err(IngestError::from)?;
    Ok(())
}
