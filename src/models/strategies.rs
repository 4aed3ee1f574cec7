//! Strategies that parameterize an ingest mode
//!
//! Transaction and validity milestoning, merge, deduplication, auditing and
//! optimization filters. Strategies whose fields can be left unset are
//! constructed through builders that validate eagerly.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// How rows in the main table are closed and opened across batches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TransactionMilestoning {
    BatchId {
        batch_id_in: String,
        batch_id_out: String,
    },
    DateTime {
        date_time_in: String,
        date_time_out: String,
    },
    BatchIdAndDateTime {
        batch_id_in: String,
        batch_id_out: String,
        date_time_in: String,
        date_time_out: String,
    },
}

impl TransactionMilestoning {
    pub fn batch_id(batch_id_in: impl Into<String>, batch_id_out: impl Into<String>) -> Self {
        TransactionMilestoning::BatchId {
            batch_id_in: batch_id_in.into(),
            batch_id_out: batch_id_out.into(),
        }
    }

    pub fn date_time(date_time_in: impl Into<String>, date_time_out: impl Into<String>) -> Self {
        TransactionMilestoning::DateTime {
            date_time_in: date_time_in.into(),
            date_time_out: date_time_out.into(),
        }
    }

    pub fn batch_id_and_date_time(
        batch_id_in: impl Into<String>,
        batch_id_out: impl Into<String>,
        date_time_in: impl Into<String>,
        date_time_out: impl Into<String>,
    ) -> Self {
        TransactionMilestoning::BatchIdAndDateTime {
            batch_id_in: batch_id_in.into(),
            batch_id_out: batch_id_out.into(),
            date_time_in: date_time_in.into(),
            date_time_out: date_time_out.into(),
        }
    }

    /// `(batch_id_in, batch_id_out)` when batch ids are tracked
    pub fn batch_id_fields(&self) -> Option<(&str, &str)> {
        match self {
            TransactionMilestoning::BatchId {
                batch_id_in,
                batch_id_out,
            }
            | TransactionMilestoning::BatchIdAndDateTime {
                batch_id_in,
                batch_id_out,
                ..
            } => Some((batch_id_in, batch_id_out)),
            TransactionMilestoning::DateTime { .. } => None,
        }
    }

    /// `(date_time_in, date_time_out)` when timestamps are tracked
    pub fn date_time_fields(&self) -> Option<(&str, &str)> {
        match self {
            TransactionMilestoning::DateTime {
                date_time_in,
                date_time_out,
            }
            | TransactionMilestoning::BatchIdAndDateTime {
                date_time_in,
                date_time_out,
                ..
            } => Some((date_time_in, date_time_out)),
            TransactionMilestoning::BatchId { .. } => None,
        }
    }

    /// The column that opens a row version and must be a primary key
    pub fn in_field(&self) -> &str {
        match self {
            TransactionMilestoning::BatchId { batch_id_in, .. }
            | TransactionMilestoning::BatchIdAndDateTime { batch_id_in, .. } => batch_id_in,
            TransactionMilestoning::DateTime { date_time_in, .. } => date_time_in,
        }
    }

    /// Every milestoning column, in/out pairs first by batch id then by time
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        if let Some((i, o)) = self.batch_id_fields() {
            fields.push(i);
            fields.push(o);
        }
        if let Some((i, o)) = self.date_time_fields() {
            fields.push(i);
            fields.push(o);
        }
        fields
    }
}

/// How the validity window of a bitemporal row is derived from staging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ValidityDerivation {
    SourceSpecifiesFrom {
        source_from: String,
    },
    SourceSpecifiesFromAndThru {
        source_from: String,
        source_thru: String,
    },
}

impl ValidityDerivation {
    pub fn source_from(&self) -> &str {
        match self {
            ValidityDerivation::SourceSpecifiesFrom { source_from }
            | ValidityDerivation::SourceSpecifiesFromAndThru { source_from, .. } => source_from,
        }
    }

    pub fn source_thru(&self) -> Option<&str> {
        match self {
            ValidityDerivation::SourceSpecifiesFrom { .. } => None,
            ValidityDerivation::SourceSpecifiesFromAndThru { source_thru, .. } => Some(source_thru),
        }
    }
}

/// Validity window columns of a bitemporal main table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidityMilestoning {
    pub date_time_from: String,
    pub date_time_thru: String,
    pub derivation: ValidityDerivation,
}

impl ValidityMilestoning {
    pub fn builder() -> ValidityMilestoningBuilder {
        ValidityMilestoningBuilder::default()
    }

    /// Source columns carrying validity in staging
    pub fn source_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.derivation.source_from()];
        if let Some(thru) = self.derivation.source_thru() {
            fields.push(thru);
        }
        fields
    }
}

#[derive(Debug, Default)]
pub struct ValidityMilestoningBuilder {
    date_time_from: Option<String>,
    date_time_thru: Option<String>,
    derivation: Option<ValidityDerivation>,
}

impl ValidityMilestoningBuilder {
    pub fn date_time_from(mut self, name: impl Into<String>) -> Self {
        self.date_time_from = Some(name.into());
        self
    }

    pub fn date_time_thru(mut self, name: impl Into<String>) -> Self {
        self.date_time_thru = Some(name.into());
        self
    }

    pub fn derivation(mut self, derivation: ValidityDerivation) -> Self {
        self.derivation = Some(derivation);
        self
    }

    pub fn build(self) -> Result<ValidityMilestoning, ConfigurationError> {
        ConfigurationError::check_required(
            "ValidityMilestoning",
            &[
                ("dateTimeFromName", self.date_time_from.is_some()),
                ("dateTimeThruName", self.date_time_thru.is_some()),
                ("validityDerivation", self.derivation.is_some()),
            ],
        )?;
        match (self.date_time_from, self.date_time_thru, self.derivation) {
            (Some(date_time_from), Some(date_time_thru), Some(derivation)) => {
                Ok(ValidityMilestoning {
                    date_time_from,
                    date_time_thru,
                    derivation,
                })
            }
            _ => Err(ConfigurationError::Invalid(
                "Cannot build ValidityMilestoning".to_string(),
            )),
        }
    }
}

/// Rows marked deleted in staging close the matching rows in main
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIndicator {
    pub delete_field: String,
    pub delete_values: Vec<String>,
}

impl DeleteIndicator {
    pub fn builder() -> DeleteIndicatorBuilder {
        DeleteIndicatorBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if self.delete_values.is_empty() {
            return Err(ConfigurationError::EmptyCollection {
                type_name: "DeleteIndicatorMergeStrategy",
                attribute: "deleteValues",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DeleteIndicatorBuilder {
    delete_field: Option<String>,
    delete_values: Vec<String>,
}

impl DeleteIndicatorBuilder {
    pub fn delete_field(mut self, name: impl Into<String>) -> Self {
        self.delete_field = Some(name.into());
        self
    }

    pub fn add_delete_value(mut self, value: impl Into<String>) -> Self {
        self.delete_values.push(value.into());
        self
    }

    pub fn add_delete_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delete_values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<MergeStrategy, ConfigurationError> {
        ConfigurationError::check_required(
            "DeleteIndicatorMergeStrategy",
            &[("deleteField", self.delete_field.is_some())],
        )?;
        let indicator = DeleteIndicator {
            delete_field: self.delete_field.unwrap_or_default(),
            delete_values: self.delete_values,
        };
        indicator.validate()?;
        Ok(MergeStrategy::DeleteIndicator(indicator))
    }
}

/// How deletions in staging are expressed
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MergeStrategy {
    #[default]
    NoDeletes,
    DeleteIndicator(DeleteIndicator),
}

impl MergeStrategy {
    pub fn delete_indicator(&self) -> Option<&DeleteIndicator> {
        match self {
            MergeStrategy::NoDeletes => None,
            MergeStrategy::DeleteIndicator(d) => Some(d),
        }
    }
}

/// Comparison deciding whether an incoming version replaces the current one
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VersionResolver {
    #[default]
    GreaterThan,
    GreaterThanEqualTo,
}

/// Keep the highest version per primary key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaxVersion {
    pub version_field: String,
    #[serde(default)]
    pub perform_deduplication: bool,
    #[serde(default)]
    pub resolver: VersionResolver,
}

impl MaxVersion {
    pub fn new(version_field: impl Into<String>) -> Self {
        Self {
            version_field: version_field.into(),
            perform_deduplication: false,
            resolver: VersionResolver::GreaterThan,
        }
    }

    pub fn perform_deduplication(mut self, enabled: bool) -> Self {
        self.perform_deduplication = enabled;
        self
    }

    pub fn resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

/// How duplicate staging rows are collapsed before ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Deduplication {
    #[default]
    None,
    AnyVersion,
    MaxVersion(MaxVersion),
    DuplicateCount {
        count_field: String,
    },
}

impl Deduplication {
    pub fn max_version(&self) -> Option<&MaxVersion> {
        match self {
            Deduplication::MaxVersion(m) => Some(m),
            _ => None,
        }
    }

    pub fn count_field(&self) -> Option<&str> {
        match self {
            Deduplication::DuplicateCount { count_field } => Some(count_field),
            _ => None,
        }
    }
}

/// Stamp inserted or updated rows with the batch start time
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Auditing {
    #[default]
    None,
    DateTime {
        date_time_field: String,
    },
}

impl Auditing {
    /// Builder for [`Auditing::DateTime`]
    pub fn date_time() -> DateTimeAuditingBuilder {
        DateTimeAuditingBuilder::default()
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Auditing::None => None,
            Auditing::DateTime { date_time_field } => Some(date_time_field),
        }
    }
}

#[derive(Debug, Default)]
pub struct DateTimeAuditingBuilder {
    date_time_field: Option<String>,
}

impl DateTimeAuditingBuilder {
    pub fn date_time_field(mut self, name: impl Into<String>) -> Self {
        self.date_time_field = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Auditing, ConfigurationError> {
        match self.date_time_field {
            Some(date_time_field) => Ok(Auditing::DateTime { date_time_field }),
            None => Err(ConfigurationError::MissingAttributes {
                type_name: "DateTimeAuditing",
                attributes: vec!["dateTimeField"],
            }),
        }
    }
}

/// Bounds a delta ingestion to a slice of the main table
///
/// The bounds are patterns substituted by the executor, e.g. `{ID_LOWER_BOUND}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationFilter {
    pub field_name: String,
    pub lower_bound_pattern: String,
    pub upper_bound_pattern: String,
    #[serde(default)]
    pub includes_null_values: bool,
}

impl OptimizationFilter {
    pub fn builder() -> OptimizationFilterBuilder {
        OptimizationFilterBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct OptimizationFilterBuilder {
    field_name: Option<String>,
    lower_bound_pattern: Option<String>,
    upper_bound_pattern: Option<String>,
    includes_null_values: bool,
}

impl OptimizationFilterBuilder {
    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    pub fn lower_bound_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.lower_bound_pattern = Some(pattern.into());
        self
    }

    pub fn upper_bound_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.upper_bound_pattern = Some(pattern.into());
        self
    }

    pub fn includes_null_values(mut self, include: bool) -> Self {
        self.includes_null_values = include;
        self
    }

    pub fn build(self) -> Result<OptimizationFilter, ConfigurationError> {
        ConfigurationError::check_required(
            "OptimizationFilter",
            &[
                ("fieldName", self.field_name.is_some()),
                ("lowerBoundPattern", self.lower_bound_pattern.is_some()),
                ("upperBoundPattern", self.upper_bound_pattern.is_some()),
            ],
        )?;
        Ok(OptimizationFilter {
            field_name: self.field_name.unwrap_or_default(),
            lower_bound_pattern: self.lower_bound_pattern.unwrap_or_default(),
            upper_bound_pattern: self.upper_bound_pattern.unwrap_or_default(),
            includes_null_values: self.includes_null_values,
        })
    }
}
