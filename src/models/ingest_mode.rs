//! Ingest modes
//!
//! An [`IngestMode`] declares how a batch of staged rows is applied to the
//! main table. Each variant has a builder that checks required attributes and
//! cross-field constraints; the schema-level checks live in
//! [`crate::validation::ingest_mode`].
//!
//! Modes read from configuration deserialize into their builder first, so a
//! job file missing an attribute fails with the same error as code that
//! forgets to set it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::strategies::{
    Auditing, Deduplication, MergeStrategy, OptimizationFilter, TransactionMilestoning,
    ValidityDerivation, ValidityMilestoning,
};
use crate::error::ConfigurationError;

/// Closed set of supported ingest modes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IngestMode {
    AppendOnly(AppendOnly),
    NontemporalSnapshot(NontemporalSnapshot),
    NontemporalDelta(NontemporalDelta),
    UnitemporalSnapshot(UnitemporalSnapshot),
    UnitemporalDelta(UnitemporalDelta),
    BitemporalSnapshot(BitemporalSnapshot),
    BitemporalDelta(BitemporalDelta),
}

impl IngestMode {
    pub fn name(&self) -> &'static str {
        match self {
            IngestMode::AppendOnly(_) => "AppendOnly",
            IngestMode::NontemporalSnapshot(_) => "NontemporalSnapshot",
            IngestMode::NontemporalDelta(_) => "NontemporalDelta",
            IngestMode::UnitemporalSnapshot(_) => "UnitemporalSnapshot",
            IngestMode::UnitemporalDelta(_) => "UnitemporalDelta",
            IngestMode::BitemporalSnapshot(_) => "BitemporalSnapshot",
            IngestMode::BitemporalDelta(_) => "BitemporalDelta",
        }
    }

    pub fn digest_field(&self) -> Option<&str> {
        match self {
            IngestMode::AppendOnly(m) => m.digest_field.as_deref(),
            IngestMode::NontemporalSnapshot(m) => m.digest_field.as_deref(),
            IngestMode::NontemporalDelta(m) => Some(&m.digest_field),
            IngestMode::UnitemporalSnapshot(m) => Some(&m.digest_field),
            IngestMode::UnitemporalDelta(m) => Some(&m.digest_field),
            IngestMode::BitemporalSnapshot(m) => Some(&m.digest_field),
            IngestMode::BitemporalDelta(m) => Some(&m.digest_field),
        }
    }

    pub fn data_split_field(&self) -> Option<&str> {
        match self {
            IngestMode::AppendOnly(m) => m.data_split_field.as_deref(),
            IngestMode::NontemporalDelta(m) => m.data_split_field.as_deref(),
            IngestMode::UnitemporalDelta(m) => m.data_split_field.as_deref(),
            IngestMode::BitemporalDelta(m) => m.data_split_field.as_deref(),
            IngestMode::NontemporalSnapshot(_)
            | IngestMode::UnitemporalSnapshot(_)
            | IngestMode::BitemporalSnapshot(_) => None,
        }
    }

    pub fn transaction_milestoning(&self) -> Option<&TransactionMilestoning> {
        match self {
            IngestMode::UnitemporalSnapshot(m) => Some(&m.transaction_milestoning),
            IngestMode::UnitemporalDelta(m) => Some(&m.transaction_milestoning),
            IngestMode::BitemporalSnapshot(m) => Some(&m.transaction_milestoning),
            IngestMode::BitemporalDelta(m) => Some(&m.transaction_milestoning),
            IngestMode::AppendOnly(_)
            | IngestMode::NontemporalSnapshot(_)
            | IngestMode::NontemporalDelta(_) => None,
        }
    }

    pub fn validity_milestoning(&self) -> Option<&ValidityMilestoning> {
        match self {
            IngestMode::BitemporalSnapshot(m) => Some(&m.validity_milestoning),
            IngestMode::BitemporalDelta(m) => Some(&m.validity_milestoning),
            _ => None,
        }
    }

    pub fn merge_strategy(&self) -> Option<&MergeStrategy> {
        match self {
            IngestMode::NontemporalDelta(m) => Some(&m.merge_strategy),
            IngestMode::UnitemporalDelta(m) => Some(&m.merge_strategy),
            IngestMode::BitemporalDelta(m) => Some(&m.merge_strategy),
            _ => None,
        }
    }

    pub fn deduplication(&self) -> Option<&Deduplication> {
        match self {
            IngestMode::NontemporalDelta(m) => Some(&m.deduplication),
            IngestMode::UnitemporalDelta(m) => Some(&m.deduplication),
            _ => None,
        }
    }

    pub fn auditing(&self) -> Option<&Auditing> {
        match self {
            IngestMode::AppendOnly(m) => Some(&m.auditing),
            IngestMode::NontemporalSnapshot(m) => Some(&m.auditing),
            IngestMode::NontemporalDelta(m) => Some(&m.auditing),
            _ => None,
        }
    }

    /// Whether the mode replaces the whole main table contents each batch
    pub fn is_snapshot(&self) -> bool {
        matches!(
            self,
            IngestMode::NontemporalSnapshot(_)
                | IngestMode::UnitemporalSnapshot(_)
                | IngestMode::BitemporalSnapshot(_)
        )
    }

    /// Re-run the builder checks on a mode assembled by hand
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            IngestMode::AppendOnly(m) => m.validate(),
            // no required attributes and no cross-field rules
            IngestMode::NontemporalSnapshot(_) => Ok(()),
            IngestMode::NontemporalDelta(m) => m.validate(),
            IngestMode::UnitemporalSnapshot(m) => m.validate(),
            IngestMode::UnitemporalDelta(m) => m.validate(),
            IngestMode::BitemporalSnapshot(m) => m.validate(),
            IngestMode::BitemporalDelta(m) => m.validate(),
        }
    }
}

fn validate_merge_strategy(strategy: &MergeStrategy) -> Result<(), ConfigurationError> {
    match strategy.delete_indicator() {
        Some(indicator) => indicator.validate(),
        None => Ok(()),
    }
}

macro_rules! impl_from_mode {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for IngestMode {
                fn from(mode: $variant) -> Self {
                    IngestMode::$variant(mode)
                }
            }
        )*
    };
}

impl_from_mode!(
    AppendOnly,
    NontemporalSnapshot,
    NontemporalDelta,
    UnitemporalSnapshot,
    UnitemporalDelta,
    BitemporalSnapshot,
    BitemporalDelta
);

macro_rules! impl_try_from_builder {
    ($($mode:ident => $builder:ident),*) => {
        $(
            impl TryFrom<$builder> for $mode {
                type Error = ConfigurationError;

                fn try_from(builder: $builder) -> Result<Self, Self::Error> {
                    builder.build()
                }
            }
        )*
    };
}

impl_try_from_builder!(
    AppendOnly => AppendOnlyBuilder,
    NontemporalSnapshot => NontemporalSnapshotBuilder,
    NontemporalDelta => NontemporalDeltaBuilder,
    UnitemporalSnapshot => UnitemporalSnapshotBuilder,
    UnitemporalDelta => UnitemporalDeltaBuilder,
    BitemporalSnapshot => BitemporalSnapshotBuilder,
    BitemporalDelta => BitemporalDeltaBuilder
);

/// Insert every staged row, optionally skipping rows already present by digest
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "AppendOnlyBuilder")]
pub struct AppendOnly {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_field: Option<String>,
    pub auditing: Auditing,
    pub filter_duplicates: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_split_field: Option<String>,
}

impl AppendOnly {
    pub fn builder() -> AppendOnlyBuilder {
        AppendOnlyBuilder::default()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.filter_duplicates && self.digest_field.is_none() {
            return Err(missing("AppendOnly", "digestField"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppendOnlyBuilder {
    digest_field: Option<String>,
    auditing: Auditing,
    filter_duplicates: bool,
    data_split_field: Option<String>,
}

impl AppendOnlyBuilder {
    pub fn digest_field(mut self, name: impl Into<String>) -> Self {
        self.digest_field = Some(name.into());
        self
    }

    pub fn auditing(mut self, auditing: Auditing) -> Self {
        self.auditing = auditing;
        self
    }

    pub fn filter_duplicates(mut self, filter: bool) -> Self {
        self.filter_duplicates = filter;
        self
    }

    pub fn data_split_field(mut self, name: impl Into<String>) -> Self {
        self.data_split_field = Some(name.into());
        self
    }

    pub fn build(self) -> Result<AppendOnly, ConfigurationError> {
        let mode = AppendOnly {
            digest_field: self.digest_field,
            auditing: self.auditing,
            filter_duplicates: self.filter_duplicates,
            data_split_field: self.data_split_field,
        };
        mode.validate()?;
        Ok(mode)
    }
}

/// Replace the main table contents with the staged rows
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "NontemporalSnapshotBuilder")]
pub struct NontemporalSnapshot {
    pub auditing: Auditing,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partition_fields: Vec<String>,
    /// When set, rows whose digest is unchanged are left in place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_field: Option<String>,
}

impl NontemporalSnapshot {
    pub fn builder() -> NontemporalSnapshotBuilder {
        NontemporalSnapshotBuilder::default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NontemporalSnapshotBuilder {
    auditing: Auditing,
    partition_fields: Vec<String>,
    digest_field: Option<String>,
}

impl NontemporalSnapshotBuilder {
    pub fn auditing(mut self, auditing: Auditing) -> Self {
        self.auditing = auditing;
        self
    }

    pub fn add_partition_field(mut self, name: impl Into<String>) -> Self {
        self.partition_fields.push(name.into());
        self
    }

    pub fn digest_field(mut self, name: impl Into<String>) -> Self {
        self.digest_field = Some(name.into());
        self
    }

    pub fn build(self) -> Result<NontemporalSnapshot, ConfigurationError> {
        Ok(NontemporalSnapshot {
            auditing: self.auditing,
            partition_fields: self.partition_fields,
            digest_field: self.digest_field,
        })
    }
}

/// Upsert staged rows by primary key, overwriting changed rows in place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "NontemporalDeltaBuilder")]
pub struct NontemporalDelta {
    pub digest_field: String,
    pub merge_strategy: MergeStrategy,
    pub auditing: Auditing,
    pub deduplication: Deduplication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_split_field: Option<String>,
}

impl NontemporalDelta {
    pub fn builder() -> NontemporalDeltaBuilder {
        NontemporalDeltaBuilder::default()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_required(
            "NontemporalDelta",
            &[("digestField", !self.digest_field.is_empty())],
        )?;
        validate_merge_strategy(&self.merge_strategy)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NontemporalDeltaBuilder {
    digest_field: Option<String>,
    merge_strategy: MergeStrategy,
    auditing: Auditing,
    deduplication: Deduplication,
    data_split_field: Option<String>,
}

impl NontemporalDeltaBuilder {
    pub fn digest_field(mut self, name: impl Into<String>) -> Self {
        self.digest_field = Some(name.into());
        self
    }

    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn auditing(mut self, auditing: Auditing) -> Self {
        self.auditing = auditing;
        self
    }

    pub fn deduplication(mut self, deduplication: Deduplication) -> Self {
        self.deduplication = deduplication;
        self
    }

    pub fn data_split_field(mut self, name: impl Into<String>) -> Self {
        self.data_split_field = Some(name.into());
        self
    }

    pub fn build(self) -> Result<NontemporalDelta, ConfigurationError> {
        let Some(digest_field) = self.digest_field else {
            return Err(missing("NontemporalDelta", "digestField"));
        };
        let mode = NontemporalDelta {
            digest_field,
            merge_strategy: self.merge_strategy,
            auditing: self.auditing,
            deduplication: self.deduplication,
            data_split_field: self.data_split_field,
        };
        mode.validate()?;
        Ok(mode)
    }
}

/// Close open rows missing from the snapshot and open rows for new or changed ones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "UnitemporalSnapshotBuilder")]
pub struct UnitemporalSnapshot {
    pub digest_field: String,
    pub transaction_milestoning: TransactionMilestoning,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partition_fields: Vec<String>,
    /// Restrict milestoning to these values of each partition field
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub partition_values_by_field: BTreeMap<String, Vec<String>>,
}

impl UnitemporalSnapshot {
    pub fn builder() -> UnitemporalSnapshotBuilder {
        UnitemporalSnapshotBuilder::default()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_required(
            "UnitemporalSnapshot",
            &[("digestField", !self.digest_field.is_empty())],
        )?;
        for field in self.partition_values_by_field.keys() {
            if !self.partition_fields.contains(field) {
                return Err(ConfigurationError::Invalid(format!(
                    "Cannot build UnitemporalSnapshot, partition field [{}] in partitionValuesByField is not one of partitionFields",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitemporalSnapshotBuilder {
    digest_field: Option<String>,
    transaction_milestoning: Option<TransactionMilestoning>,
    partition_fields: Vec<String>,
    partition_values_by_field: BTreeMap<String, Vec<String>>,
}

impl UnitemporalSnapshotBuilder {
    pub fn digest_field(mut self, name: impl Into<String>) -> Self {
        self.digest_field = Some(name.into());
        self
    }

    pub fn transaction_milestoning(mut self, milestoning: TransactionMilestoning) -> Self {
        self.transaction_milestoning = Some(milestoning);
        self
    }

    pub fn add_partition_field(mut self, name: impl Into<String>) -> Self {
        self.partition_fields.push(name.into());
        self
    }

    pub fn put_partition_values<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_values_by_field
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Result<UnitemporalSnapshot, ConfigurationError> {
        ConfigurationError::check_required(
            "UnitemporalSnapshot",
            &[
                ("digestField", self.digest_field.is_some()),
                (
                    "transactionMilestoning",
                    self.transaction_milestoning.is_some(),
                ),
            ],
        )?;
        let (Some(digest_field), Some(transaction_milestoning)) =
            (self.digest_field, self.transaction_milestoning)
        else {
            return Err(missing("UnitemporalSnapshot", "transactionMilestoning"));
        };
        let mode = UnitemporalSnapshot {
            digest_field,
            transaction_milestoning,
            partition_fields: self.partition_fields,
            partition_values_by_field: self.partition_values_by_field,
        };
        mode.validate()?;
        Ok(mode)
    }
}

/// Milestone changed rows and open new versions for incoming changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "UnitemporalDeltaBuilder")]
pub struct UnitemporalDelta {
    pub digest_field: String,
    pub transaction_milestoning: TransactionMilestoning,
    pub merge_strategy: MergeStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_split_field: Option<String>,
    /// Match on these fields instead of the staging primary keys
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_fields: Vec<String>,
    pub deduplication: Deduplication,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optimization_filters: Vec<OptimizationFilter>,
}

impl UnitemporalDelta {
    pub fn builder() -> UnitemporalDeltaBuilder {
        UnitemporalDeltaBuilder::default()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_required(
            "UnitemporalDelta",
            &[("digestField", !self.digest_field.is_empty())],
        )?;
        validate_merge_strategy(&self.merge_strategy)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitemporalDeltaBuilder {
    digest_field: Option<String>,
    transaction_milestoning: Option<TransactionMilestoning>,
    merge_strategy: MergeStrategy,
    data_split_field: Option<String>,
    key_fields: Vec<String>,
    deduplication: Deduplication,
    optimization_filters: Vec<OptimizationFilter>,
}

impl UnitemporalDeltaBuilder {
    pub fn digest_field(mut self, name: impl Into<String>) -> Self {
        self.digest_field = Some(name.into());
        self
    }

    pub fn transaction_milestoning(mut self, milestoning: TransactionMilestoning) -> Self {
        self.transaction_milestoning = Some(milestoning);
        self
    }

    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn data_split_field(mut self, name: impl Into<String>) -> Self {
        self.data_split_field = Some(name.into());
        self
    }

    pub fn add_key_field(mut self, name: impl Into<String>) -> Self {
        self.key_fields.push(name.into());
        self
    }

    pub fn deduplication(mut self, deduplication: Deduplication) -> Self {
        self.deduplication = deduplication;
        self
    }

    pub fn add_optimization_filter(mut self, filter: OptimizationFilter) -> Self {
        self.optimization_filters.push(filter);
        self
    }

    pub fn build(self) -> Result<UnitemporalDelta, ConfigurationError> {
        ConfigurationError::check_required(
            "UnitemporalDelta",
            &[
                ("digestField", self.digest_field.is_some()),
                (
                    "transactionMilestoning",
                    self.transaction_milestoning.is_some(),
                ),
            ],
        )?;
        let (Some(digest_field), Some(transaction_milestoning)) =
            (self.digest_field, self.transaction_milestoning)
        else {
            return Err(missing("UnitemporalDelta", "transactionMilestoning"));
        };
        let mode = UnitemporalDelta {
            digest_field,
            transaction_milestoning,
            merge_strategy: self.merge_strategy,
            data_split_field: self.data_split_field,
            key_fields: self.key_fields,
            deduplication: self.deduplication,
            optimization_filters: self.optimization_filters,
        };
        mode.validate()?;
        Ok(mode)
    }
}

/// Bitemporal snapshot where staging carries both ends of the validity window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "BitemporalSnapshotBuilder")]
pub struct BitemporalSnapshot {
    pub digest_field: String,
    pub transaction_milestoning: TransactionMilestoning,
    pub validity_milestoning: ValidityMilestoning,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partition_fields: Vec<String>,
}

impl BitemporalSnapshot {
    pub fn builder() -> BitemporalSnapshotBuilder {
        BitemporalSnapshotBuilder::default()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_required(
            "BitemporalSnapshot",
            &[("digestField", !self.digest_field.is_empty())],
        )?;
        match self.validity_milestoning.derivation {
            ValidityDerivation::SourceSpecifiesFromAndThru { .. } => Ok(()),
            ValidityDerivation::SourceSpecifiesFrom { .. } => Err(ConfigurationError::Invalid(
                "Cannot build BitemporalSnapshot, validityDerivation must be SourceSpecifiesFromAndThru"
                    .to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BitemporalSnapshotBuilder {
    digest_field: Option<String>,
    transaction_milestoning: Option<TransactionMilestoning>,
    validity_milestoning: Option<ValidityMilestoning>,
    partition_fields: Vec<String>,
}

impl BitemporalSnapshotBuilder {
    pub fn digest_field(mut self, name: impl Into<String>) -> Self {
        self.digest_field = Some(name.into());
        self
    }

    pub fn transaction_milestoning(mut self, milestoning: TransactionMilestoning) -> Self {
        self.transaction_milestoning = Some(milestoning);
        self
    }

    pub fn validity_milestoning(mut self, milestoning: ValidityMilestoning) -> Self {
        self.validity_milestoning = Some(milestoning);
        self
    }

    pub fn add_partition_field(mut self, name: impl Into<String>) -> Self {
        self.partition_fields.push(name.into());
        self
    }

    pub fn build(self) -> Result<BitemporalSnapshot, ConfigurationError> {
        ConfigurationError::check_required(
            "BitemporalSnapshot",
            &[
                ("digestField", self.digest_field.is_some()),
                (
                    "transactionMilestoning",
                    self.transaction_milestoning.is_some(),
                ),
                ("validityMilestoning", self.validity_milestoning.is_some()),
            ],
        )?;
        let (Some(digest_field), Some(transaction_milestoning), Some(validity_milestoning)) = (
            self.digest_field,
            self.transaction_milestoning,
            self.validity_milestoning,
        ) else {
            return Err(missing("BitemporalSnapshot", "validityMilestoning"));
        };
        let mode = BitemporalSnapshot {
            digest_field,
            transaction_milestoning,
            validity_milestoning,
            partition_fields: self.partition_fields,
        };
        mode.validate()?;
        Ok(mode)
    }
}

/// Bitemporal delta ingestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "BitemporalDeltaBuilder")]
pub struct BitemporalDelta {
    pub digest_field: String,
    pub merge_strategy: MergeStrategy,
    pub transaction_milestoning: TransactionMilestoning,
    pub validity_milestoning: ValidityMilestoning,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_split_field: Option<String>,
}

impl BitemporalDelta {
    pub fn builder() -> BitemporalDeltaBuilder {
        BitemporalDeltaBuilder::default()
    }

    /// Staging carries only the start of validity; ends are derived from later starts
    pub fn is_source_from_only(&self) -> bool {
        matches!(
            self.validity_milestoning.derivation,
            ValidityDerivation::SourceSpecifiesFrom { .. }
        )
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_required(
            "BitemporalDelta",
            &[("digestField", !self.digest_field.is_empty())],
        )?;
        validate_merge_strategy(&self.merge_strategy)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BitemporalDeltaBuilder {
    digest_field: Option<String>,
    merge_strategy: MergeStrategy,
    transaction_milestoning: Option<TransactionMilestoning>,
    validity_milestoning: Option<ValidityMilestoning>,
    data_split_field: Option<String>,
}

impl BitemporalDeltaBuilder {
    pub fn digest_field(mut self, name: impl Into<String>) -> Self {
        self.digest_field = Some(name.into());
        self
    }

    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn transaction_milestoning(mut self, milestoning: TransactionMilestoning) -> Self {
        self.transaction_milestoning = Some(milestoning);
        self
    }

    pub fn validity_milestoning(mut self, milestoning: ValidityMilestoning) -> Self {
        self.validity_milestoning = Some(milestoning);
        self
    }

    pub fn data_split_field(mut self, name: impl Into<String>) -> Self {
        self.data_split_field = Some(name.into());
        self
    }

    pub fn build(self) -> Result<BitemporalDelta, ConfigurationError> {
        ConfigurationError::check_required(
            "BitemporalDelta",
            &[
                ("digestField", self.digest_field.is_some()),
                (
                    "transactionMilestoning",
                    self.transaction_milestoning.is_some(),
                ),
                ("validityMilestoning", self.validity_milestoning.is_some()),
            ],
        )?;
        let (Some(digest_field), Some(transaction_milestoning), Some(validity_milestoning)) = (
            self.digest_field,
            self.transaction_milestoning,
            self.validity_milestoning,
        ) else {
            return Err(missing("BitemporalDelta", "validityMilestoning"));
        };
        let mode = BitemporalDelta {
            digest_field,
            merge_strategy: self.merge_strategy,
            transaction_milestoning,
            validity_milestoning,
            data_split_field: self.data_split_field,
        };
        mode.validate()?;
        Ok(mode)
    }
}

fn missing(type_name: &'static str, attribute: &'static str) -> ConfigurationError {
    ConfigurationError::MissingAttributes {
        type_name,
        attributes: vec![attribute],
    }
}
