//! Values and predicates shared by every ingest mode

use super::{INFINITE_BATCH_ID, INFINITE_TIMESTAMP, PlannerOptions};
use crate::logical_plan::{
    Comparator, Condition, FieldRef, FunctionName, Operation, Selection, Source, TableRef,
    TimestampValue, Value,
};
use crate::models::{
    DataSplitRange, Datasets, Deduplication, DeleteIndicator, FilterType, FilterValue, IngestMode,
    MAIN_ALIAS, STAGING_ALIAS, TransactionMilestoning, VersionResolver,
};

pub(crate) const METADATA_ALIAS: &str = "batch_metadata";
pub(crate) const TEMP_ALIAS: &str = "temp";
pub(crate) const TEMP_WITH_DELETE_INDICATOR_ALIAS: &str = "tempWithDeleteIndicator";
const ROW_NUMBER_FIELD: &str = "row_num";

/// Everything a mode planner needs to know about the batch being planned
#[derive(Debug, Clone)]
pub(crate) struct PlanContext<'a> {
    pub mode: &'a IngestMode,
    pub datasets: &'a Datasets,
    pub options: &'a PlannerOptions,
    pub split: Option<DataSplitRange>,
    /// The sink can run a MERGE
    pub merge: bool,
    pub main: TableRef,
    pub staging: TableRef,
    temp_name: String,
    temp_with_delete_indicator_name: String,
}

/// FROM clause for reading staging rows, plus the filter left for the caller
///
/// When the source had to become a derived table the staging conditions are
/// inside it and `condition` is `None`.
#[derive(Debug, Clone)]
pub(crate) struct StagingSource {
    pub source: Source,
    pub condition: Option<Condition>,
}

impl<'a> PlanContext<'a> {
    pub fn new(
        mode: &'a IngestMode,
        datasets: &'a Datasets,
        options: &'a PlannerOptions,
        split: Option<DataSplitRange>,
    ) -> Self {
        let suffix = options
            .temp_table_suffix
            .as_deref()
            .map(|id| format!("_{}", id))
            .unwrap_or_default();
        let temp_name = datasets
            .temp_name
            .clone()
            .unwrap_or_else(|| format!("{}_{}{}", datasets.main.name, TEMP_ALIAS, suffix));
        let temp_with_delete_indicator_name = datasets
            .temp_with_delete_indicator_name
            .clone()
            .unwrap_or_else(|| {
                format!(
                    "{}_{}{}",
                    datasets.main.name, TEMP_WITH_DELETE_INDICATOR_ALIAS, suffix
                )
            });
        Self {
            mode,
            datasets,
            options,
            split,
            merge: false,
            main: TableRef::from_dataset(&datasets.main, MAIN_ALIAS),
            staging: TableRef::from_dataset(&datasets.staging, STAGING_ALIAS),
            temp_name,
            temp_with_delete_indicator_name,
        }
    }

    pub fn main_alias(&self) -> &str {
        self.main.qualifier()
    }

    pub fn stage_alias(&self) -> &str {
        self.staging.qualifier()
    }

    pub fn main_field(&self, name: &str) -> Value {
        Value::field(self.main_alias(), name)
    }

    pub fn stage_field(&self, name: &str) -> Value {
        Value::field(self.stage_alias(), name)
    }

    pub fn main_field_ref(&self, name: &str) -> FieldRef {
        FieldRef::new(self.main_alias(), name)
    }

    pub fn metadata_table(&self) -> TableRef {
        let metadata = &self.datasets.metadata;
        TableRef {
            database: metadata.database.clone(),
            group: metadata.group.clone(),
            name: metadata.name.clone(),
            alias: Some(METADATA_ALIAS.to_string()),
        }
    }

    pub fn temp_table(&self) -> TableRef {
        TableRef {
            name: self.temp_name.clone(),
            alias: Some(TEMP_ALIAS.to_string()),
            ..self.main.clone()
        }
    }

    pub fn temp_with_delete_indicator_table(&self) -> TableRef {
        TableRef {
            name: self.temp_with_delete_indicator_name.clone(),
            alias: Some(TEMP_WITH_DELETE_INDICATOR_ALIAS.to_string()),
            ..self.main.clone()
        }
    }

    /// Keys matched between main and staging
    ///
    /// Staging primary keys, unless the mode names its own key fields.
    pub fn primary_keys(&self) -> Vec<&'a str> {
        if let IngestMode::UnitemporalDelta(mode) = self.mode
            && !mode.key_fields.is_empty()
        {
            return mode.key_fields.iter().map(String::as_str).collect();
        }
        self.datasets.staging.primary_keys()
    }

    /// `(sink.k = stage.k) AND ...` over the matched keys
    pub fn pk_match(&self) -> Option<Condition> {
        key_match(&self.primary_keys(), self.main_alias(), self.stage_alias())
    }

    pub fn digest_matches(&self) -> Option<Condition> {
        let digest = self.mode.digest_field()?;
        Some(Condition::eq(
            self.main_field(digest),
            self.stage_field(digest),
        ))
    }

    pub fn digest_differs(&self) -> Option<Condition> {
        let digest = self.mode.digest_field()?;
        Some(Condition::ne(
            self.main_field(digest),
            self.stage_field(digest),
        ))
    }

    pub fn delete_indicator(&self) -> Option<&'a DeleteIndicator> {
        self.mode.merge_strategy()?.delete_indicator()
    }

    /// `stage.delete IN (...)`
    pub fn delete_marked(&self) -> Option<Condition> {
        let indicator = self.delete_indicator()?;
        Some(Condition::in_values(
            self.stage_field(&indicator.delete_field),
            delete_values(indicator),
        ))
    }

    /// `stage.delete NOT IN (...)`
    pub fn delete_not_marked(&self) -> Option<Condition> {
        let indicator = self.delete_indicator()?;
        Some(Condition::not_in_values(
            self.stage_field(&indicator.delete_field),
            delete_values(indicator),
        ))
    }

    /// `(stage.split >= lower) AND (stage.split <= upper)` for the planned range
    pub fn split_condition(&self) -> Option<Condition> {
        let field = self.mode.data_split_field()?;
        let range = self.split?;
        Condition::and(vec![
            Condition::compare(
                self.stage_field(field),
                Comparator::Gte,
                Value::Integer(range.lower),
            ),
            Condition::compare(
                self.stage_field(field),
                Comparator::Lte,
                Value::Integer(range.upper),
            ),
        ])
    }

    /// Restrictions declared on the staging dataset
    pub fn filter_conditions(&self) -> Vec<Condition> {
        self.datasets
            .staging
            .filters
            .iter()
            .map(|filter| {
                let value = match &filter.value {
                    FilterValue::Integer(v) => Value::Integer(*v),
                    FilterValue::Text(v) => Value::string(v.as_str()),
                };
                Condition::compare(
                    self.stage_field(&filter.field),
                    comparator(filter.filter_type),
                    value,
                )
            })
            .collect()
    }

    /// Staging filters and the data split, as one predicate
    pub fn staging_conditions(&self) -> Option<Condition> {
        let mut parts = self.filter_conditions();
        parts.extend(self.split_condition());
        Condition::and(parts)
    }

    /// Columns copied from staging into main, in staging order
    pub fn data_fields(&self) -> Vec<&'a str> {
        let mut excluded: Vec<&str> = Vec::new();
        if let Some(indicator) = self.delete_indicator() {
            excluded.push(&indicator.delete_field);
        }
        excluded.extend(self.mode.data_split_field());
        let count_field = self.mode.deduplication().and_then(Deduplication::count_field);
        excluded.extend(count_field);
        if let Some(validity) = self.mode.validity_milestoning() {
            for field in validity.source_fields() {
                if !self.datasets.main.has_column(field) {
                    excluded.push(field);
                }
            }
        }
        let mut fields: Vec<&'a str> = self
            .datasets
            .staging
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !excluded.contains(name))
            .collect();
        fields.extend(count_field);
        fields
    }

    /// Where the ingest reads staging rows from
    ///
    /// Deduplication always needs a derived table. Staging conditions go
    /// into one only when `derived` is set, as a MERGE cannot take them on
    /// its own WHERE.
    pub fn staging_source(&self, derived: bool) -> StagingSource {
        let conditions = self.staging_conditions();
        let deduplication = self.mode.deduplication().cloned().unwrap_or_default();
        let deduplicates = match &deduplication {
            Deduplication::None => false,
            Deduplication::MaxVersion(max) => max.perform_deduplication,
            Deduplication::AnyVersion | Deduplication::DuplicateCount { .. } => true,
        };
        if !deduplicates && !(derived && conditions.is_some()) {
            return StagingSource {
                source: self.staging.clone().into(),
                condition: conditions,
            };
        }

        let count_field = deduplication.count_field();
        let columns: Vec<Value> = self
            .datasets
            .staging
            .column_names()
            .into_iter()
            .filter(|name| Some(*name) != count_field)
            .map(|name| self.stage_field(name))
            .collect();
        let alias = self.stage_alias();
        let selection = match &deduplication {
            Deduplication::AnyVersion => {
                Selection::from(self.staging.clone(), columns).filter(conditions).distinct()
            }
            Deduplication::DuplicateCount { count_field } => {
                let mut values = columns.clone();
                values.push(Value::count_all().alias(count_field.as_str()));
                Selection::from(self.staging.clone(), values)
                    .filter(conditions)
                    .group_by(columns)
            }
            Deduplication::MaxVersion(max) if max.perform_deduplication => {
                let mut ranked = columns.clone();
                ranked.push(
                    Value::RowNumber {
                        partition_by: self
                            .primary_keys()
                            .into_iter()
                            .map(|k| self.stage_field(k))
                            .collect(),
                        order_by_desc: vec![self.stage_field(&max.version_field)],
                    }
                    .alias(ROW_NUMBER_FIELD),
                );
                let inner = Selection::from(self.staging.clone(), ranked)
                    .filter(conditions)
                    .alias(alias);
                Selection::from(inner, columns).filter(Some(Condition::eq(
                    self.stage_field(ROW_NUMBER_FIELD),
                    Value::Integer(1),
                )))
            }
            Deduplication::None | Deduplication::MaxVersion(_) => {
                Selection::from(self.staging.clone(), columns).filter(conditions)
            }
        };
        StagingSource {
            source: selection.alias(alias).into(),
            condition: None,
        }
    }

    /// `stage.version > sink.version` (`>=` with the inclusive resolver)
    pub fn version_newer(&self) -> Option<Condition> {
        let max = self.mode.deduplication()?.max_version()?;
        let comparator = match max.resolver {
            VersionResolver::GreaterThan => Comparator::Gt,
            VersionResolver::GreaterThanEqualTo => Comparator::Gte,
        };
        Some(Condition::compare(
            self.stage_field(&max.version_field),
            comparator,
            self.main_field(&max.version_field),
        ))
    }

    /// Negation of [`Self::version_newer`]
    pub fn version_not_newer(&self) -> Option<Condition> {
        let max = self.mode.deduplication()?.max_version()?;
        let comparator = match max.resolver {
            VersionResolver::GreaterThan => Comparator::Lte,
            VersionResolver::GreaterThanEqualTo => Comparator::Lt,
        };
        Some(Condition::compare(
            self.stage_field(&max.version_field),
            comparator,
            self.main_field(&max.version_field),
        ))
    }

    /// The staged row replaces the current one
    ///
    /// Version comparison under max-version deduplication, digest inequality otherwise.
    pub fn changed(&self) -> Option<Condition> {
        self.version_newer().or_else(|| self.digest_differs())
    }

    /// The staged row carries nothing new for the current one
    pub fn unchanged(&self) -> Option<Condition> {
        self.version_not_newer().or_else(|| self.digest_matches())
    }

    /// `INSERT INTO main (fields, extra...) (SELECT stage.fields, extra... FROM staging WHERE ...)`
    ///
    /// The staging conditions come first in the WHERE, followed by `predicates`.
    pub fn insert_into_main(
        &self,
        staging: StagingSource,
        extra: Vec<(&str, Value)>,
        predicates: Vec<Option<Condition>>,
    ) -> Operation {
        let fields = self.data_fields();
        let mut columns: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let mut values: Vec<Value> = fields.iter().map(|f| self.stage_field(f)).collect();
        for (column, value) in extra {
            columns.push(column.to_string());
            values.push(value);
        }
        let mut parts = vec![staging.condition];
        parts.extend(predicates);
        Operation::Insert {
            table: self.main.unaliased(),
            columns,
            source: Selection::from(staging.source, values).filter(Condition::and_opt(parts)),
        }
    }

    pub fn batch_id(&self) -> Value {
        if let Some(pattern) = &self.options.batch_id_pattern {
            return Value::Raw(pattern.clone());
        }
        let metadata = &self.datasets.metadata;
        let batch_id = FieldRef::new(METADATA_ALIAS, metadata.table_batch_id_field.as_str());
        let table_name = Value::field(METADATA_ALIAS, &metadata.table_name_field);
        let next = Value::function(
            FunctionName::Coalesce,
            vec![
                Value::function(FunctionName::Max, vec![Value::Field(batch_id)]),
                Value::Integer(0),
            ],
        )
        .plus(Value::Integer(1));
        let lookup = Selection::from(self.metadata_table(), vec![next]).filter(Some(
            Condition::eq(
                Value::function(FunctionName::Upper, vec![table_name]),
                Value::string(self.datasets.main.name.to_uppercase()),
            ),
        ));
        Value::subquery(lookup)
    }

    pub fn previous_batch_id(&self) -> Value {
        self.batch_id().minus(Value::Integer(1))
    }

    pub fn batch_start(&self) -> Value {
        match &self.options.batch_start_timestamp_pattern {
            Some(pattern) => Value::Timestamp(TimestampValue::Pattern(pattern.clone())),
            None => Value::Timestamp(TimestampValue::Literal(self.options.execution_timestamp)),
        }
    }

    pub fn batch_end(&self) -> Value {
        match &self.options.batch_end_timestamp_pattern {
            Some(pattern) => Value::Timestamp(TimestampValue::Pattern(pattern.clone())),
            None => Value::function(FunctionName::CurrentTimestamp, Vec::new()),
        }
    }

    pub fn transaction_milestoning(&self) -> Option<&'a TransactionMilestoning> {
        self.mode.transaction_milestoning()
    }

    /// `sink.out = INF` on the column that marks a row as current
    pub fn open_row(&self, alias: &str) -> Option<Condition> {
        let milestoning = self.transaction_milestoning()?;
        Some(match milestoning.batch_id_fields() {
            Some((_, out)) => Condition::eq(Value::field(alias, out), infinite_batch_id()),
            None => {
                let (_, out) = milestoning.date_time_fields()?;
                Condition::eq(Value::field(alias, out), infinite_timestamp())
            }
        })
    }

    /// Assignments closing the current version of a row
    pub fn close_assignments(&self) -> Vec<(FieldRef, Value)> {
        let Some(milestoning) = self.transaction_milestoning() else {
            return Vec::new();
        };
        let mut assignments = Vec::new();
        if let Some((_, out)) = milestoning.batch_id_fields() {
            assignments.push((self.main_field_ref(out), self.previous_batch_id()));
        }
        if let Some((_, out)) = milestoning.date_time_fields() {
            assignments.push((self.main_field_ref(out), self.batch_start()));
        }
        assignments
    }

    /// `(column, value)` pairs opening a new version of a row
    pub fn open_values(&self) -> Vec<(&'a str, Value)> {
        let Some(milestoning) = self.transaction_milestoning() else {
            return Vec::new();
        };
        let mut values = Vec::new();
        if let Some((i, o)) = milestoning.batch_id_fields() {
            values.push((i, self.batch_id()));
            values.push((o, infinite_batch_id()));
        }
        if let Some((i, o)) = milestoning.date_time_fields() {
            values.push((i, self.batch_start()));
            values.push((o, infinite_timestamp()));
        }
        values
    }

    /// Audit column and its value, when auditing is on
    pub fn audit(&self) -> Option<(&'a str, Value)> {
        let field = self.mode.auditing()?.field()?;
        Some((field, self.batch_start()))
    }

    /// `sink.f >= 'lower' AND sink.f <= 'upper'` per optimization filter
    pub fn optimization_conditions(&self) -> Vec<Condition> {
        let IngestMode::UnitemporalDelta(mode) = self.mode else {
            return Vec::new();
        };
        mode.optimization_filters
            .iter()
            .filter_map(|filter| {
                let field = self.main_field(&filter.field_name);
                let bounded = Condition::and(vec![
                    Condition::compare(
                        field.clone(),
                        Comparator::Gte,
                        Value::string(filter.lower_bound_pattern.as_str()),
                    ),
                    Condition::compare(
                        field.clone(),
                        Comparator::Lte,
                        Value::string(filter.upper_bound_pattern.as_str()),
                    ),
                ])?;
                if filter.includes_null_values {
                    Condition::or(vec![bounded, Condition::IsNull(field)])
                } else {
                    Some(bounded)
                }
            })
            .collect()
    }
}

/// `(left.k = right.k) AND ...`
pub(crate) fn key_match(keys: &[&str], left: &str, right: &str) -> Option<Condition> {
    Condition::and(
        keys.iter()
            .map(|k| Condition::eq(Value::field(left, k), Value::field(right, k)))
            .collect(),
    )
}

pub(crate) fn infinite_batch_id() -> Value {
    Value::Integer(INFINITE_BATCH_ID)
}

pub(crate) fn infinite_timestamp() -> Value {
    Value::Timestamp(TimestampValue::Pattern(INFINITE_TIMESTAMP.to_string()))
}

fn delete_values(indicator: &DeleteIndicator) -> Vec<Value> {
    indicator
        .delete_values
        .iter()
        .map(|v| Value::string(v.as_str()))
        .collect()
}

fn comparator(filter_type: FilterType) -> Comparator {
    match filter_type {
        FilterType::Gt => Comparator::Gt,
        FilterType::Gte => Comparator::Gte,
        FilterType::Lt => Comparator::Lt,
        FilterType::Lte => Comparator::Lte,
        FilterType::Eq => Comparator::Eq,
        FilterType::Ne => Comparator::Ne,
    }
}
