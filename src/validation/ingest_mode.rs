//! Schema validation of an ingest mode against its datasets
//!
//! Builders only check that required attributes are set. This module checks
//! that the fields they name exist in the right dataset and carry the right
//! key flags.

use crate::error::SchemaError;
use crate::models::{Dataset, Datasets, IngestMode, TransactionMilestoning, ValidityMilestoning};

/// Validates an ingest mode against main and staging datasets
#[derive(Debug, Default)]
pub struct IngestModeValidator;

impl IngestModeValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate `mode` against `datasets`
    ///
    /// # Returns
    ///
    /// The first [`SchemaError`] found, or `Ok(())` if the mode can be planned.
    pub fn validate(&self, mode: &IngestMode, datasets: &Datasets) -> Result<(), SchemaError> {
        self.validate_inner(mode, datasets).inspect_err(|e| {
            tracing::warn!(ingest_mode = mode.name(), error = %e, "ingest mode failed validation");
        })
    }

    fn validate_inner(&self, mode: &IngestMode, datasets: &Datasets) -> Result<(), SchemaError> {
        let main = &datasets.main;
        let staging = &datasets.staging;

        if requires_primary_keys(mode) && staging.primary_keys().is_empty() {
            return Err(SchemaError::EmptyPrimaryKeys);
        }

        if let Some(digest) = mode.digest_field() {
            require_in_staging(staging, "Digest field", digest)?;
        }
        if let Some(split) = mode.data_split_field() {
            require_in_staging(staging, "Data split field", split)?;
        }
        if let Some(indicator) = mode.merge_strategy().and_then(|m| m.delete_indicator()) {
            require_in_staging(staging, "Delete indicator", &indicator.delete_field)?;
        }
        if let Some(max_version) = mode.deduplication().and_then(|d| d.max_version()) {
            require_in_staging(staging, "Version field", &max_version.version_field)?;
        }
        if let Some(field) = mode.auditing().and_then(|a| a.field()) {
            require_in_main(main, field)?;
        }
        if let Some(milestoning) = mode.transaction_milestoning() {
            validate_transaction_milestoning(main, milestoning)?;
        }
        if let Some(validity) = mode.validity_milestoning() {
            validate_validity_milestoning(main, staging, validity)?;
        }

        match mode {
            IngestMode::NontemporalSnapshot(m) => {
                for field in &m.partition_fields {
                    require_in_staging(staging, "Partition field", field)?;
                }
            }
            IngestMode::UnitemporalSnapshot(m) => {
                for field in &m.partition_fields {
                    require_in_staging(staging, "Partition field", field)?;
                }
            }
            IngestMode::BitemporalSnapshot(m) => {
                for field in &m.partition_fields {
                    require_in_staging(staging, "Partition field", field)?;
                }
            }
            IngestMode::UnitemporalDelta(m) => {
                for field in &m.key_fields {
                    require_in_staging(staging, "Key field", field)?;
                }
                for filter in &m.optimization_filters {
                    require_in_main(main, &filter.field_name)?;
                }
            }
            IngestMode::AppendOnly(_)
            | IngestMode::NontemporalDelta(_)
            | IngestMode::BitemporalDelta(_) => {}
        }

        Ok(())
    }
}

fn requires_primary_keys(mode: &IngestMode) -> bool {
    match mode {
        IngestMode::AppendOnly(m) => m.filter_duplicates,
        IngestMode::NontemporalSnapshot(_) => false,
        IngestMode::UnitemporalDelta(m) => m.key_fields.is_empty(),
        IngestMode::NontemporalDelta(_)
        | IngestMode::UnitemporalSnapshot(_)
        | IngestMode::BitemporalSnapshot(_)
        | IngestMode::BitemporalDelta(_) => true,
    }
}

fn require_in_staging(
    staging: &Dataset,
    kind: &'static str,
    field: &str,
) -> Result<(), SchemaError> {
    if staging.has_column(field) {
        Ok(())
    } else {
        Err(SchemaError::MissingInStaging {
            kind,
            field: field.to_string(),
        })
    }
}

fn require_in_main(main: &Dataset, field: &str) -> Result<(), SchemaError> {
    if main.has_column(field) {
        Ok(())
    } else {
        Err(SchemaError::FieldNotFound(field.to_string()))
    }
}

fn require_primary_key(main: &Dataset, field: &str) -> Result<(), SchemaError> {
    match main.column(field) {
        None => Err(SchemaError::FieldNotFound(field.to_string())),
        Some(column) if !column.primary_key => Err(SchemaError::NotPrimaryKey(field.to_string())),
        Some(_) => Ok(()),
    }
}

fn validate_transaction_milestoning(
    main: &Dataset,
    milestoning: &TransactionMilestoning,
) -> Result<(), SchemaError> {
    require_primary_key(main, milestoning.in_field())?;
    for field in milestoning.fields() {
        require_in_main(main, field)?;
    }
    Ok(())
}

fn validate_validity_milestoning(
    main: &Dataset,
    staging: &Dataset,
    validity: &ValidityMilestoning,
) -> Result<(), SchemaError> {
    require_primary_key(main, &validity.date_time_from)?;
    require_in_main(main, &validity.date_time_thru)?;
    for field in validity.source_fields() {
        require_in_staging(staging, "Source validity field", field)?;
    }
    Ok(())
}
