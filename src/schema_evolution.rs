//! Evolve the main table so it can accept the staging schema
//!
//! Staging columns missing from main are added. Columns whose type differs
//! are widened when the sink converts implicitly, altered when the sink
//! allows an explicit conversion, and rejected otherwise. Main columns that
//! staging no longer provides are made nullable.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::logical_plan::{AlterKind, LogicalPlan, Operation, TableRef};
use crate::models::{Column, Dataset, IngestMode, MAIN_ALIAS};
use crate::sink::{Capability, Sink};

/// ALTER statements plus the main dataset as it looks once they have run
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEvolutionResult {
    pub plan: LogicalPlan,
    pub evolved_dataset: Dataset,
}

pub struct SchemaEvolution<'a> {
    sink: &'a dyn Sink,
    mode: &'a IngestMode,
}

impl<'a> SchemaEvolution<'a> {
    pub fn new(sink: &'a dyn Sink, mode: &'a IngestMode) -> Self {
        Self { sink, mode }
    }

    pub fn evolve(&self, main: &Dataset, staging: &Dataset) -> Result<SchemaEvolutionResult, SchemaError> {
        let table = TableRef::from_dataset(main, MAIN_ALIAS).unaliased();
        let mut operations = Vec::new();
        let mut modified = Vec::new();

        let staging_only = self.staging_only_fields(main);
        for column in staging
            .columns
            .iter()
            .filter(|c| !staging_only.contains(c.name.as_str()))
        {
            match main.column(&column.name) {
                None => {
                    if !self.sink.supports(Capability::AddColumn) {
                        warn!(field = %column.name, sink = self.sink.name(), "Cannot add column");
                        return Err(SchemaError::StagingFieldMissingInMain(column.name.clone()));
                    }
                    operations.push(alter(&table, AlterKind::AddColumn, column.clone()));
                    modified.push(column.clone());
                }
                Some(existing) if existing.same_type(column) => {}
                Some(existing) => {
                    let evolved = self.evolve_type(existing, column)?;
                    if evolved != *existing {
                        operations.push(alter(&table, AlterKind::ChangeDatatype, evolved.clone()));
                        modified.push(evolved);
                    }
                }
            }
        }

        let main_only = self.main_only_fields();
        for column in main
            .columns
            .iter()
            .filter(|c| !main_only.contains(c.name.as_str()) && !staging.has_column(&c.name))
        {
            if column.primary_key {
                return Err(SchemaError::NonNullableFieldMissing(column.name.clone()));
            }
            let mut nullable = column.clone();
            nullable.nullable = true;
            operations.push(alter(&table, AlterKind::NullableColumn, column.clone()));
            modified.push(nullable);
        }

        debug!(
            table = %main.name,
            sink = self.sink.name(),
            alters = operations.len(),
            "Planned schema evolution"
        );
        Ok(SchemaEvolutionResult {
            plan: LogicalPlan::new(operations),
            evolved_dataset: evolved_dataset(main, modified),
        })
    }

    /// Column definition after a type change, or the breaking change that prevents it
    fn evolve_type(&self, main: &Column, staging: &Column) -> Result<Column, SchemaError> {
        if main.data_type == staging.data_type {
            return Ok(self.evolve_sizing(staging, main));
        }
        if self.sink.supports(Capability::ImplicitDataTypeConversion)
            && self
                .sink
                .supports_implicit_mapping(main.data_type, staging.data_type)
        {
            return Ok(self.evolve_sizing(staging, main));
        }
        if self.sink.supports(Capability::ExplicitDataTypeConversion)
            && self
                .sink
                .supports_explicit_mapping(main.data_type, staging.data_type)
        {
            return Ok(self.evolve_sizing(main, staging));
        }
        warn!(
            field = %main.name,
            from = %main.data_type,
            to = %staging.data_type,
            "Breaking schema change"
        );
        Err(SchemaError::BreakingChange {
            from: main.data_type.to_string(),
            to: staging.data_type.to_string(),
        })
    }

    /// `target` with the larger length and scale of the two columns
    ///
    /// An unspecified size only inherits a size from a column of the same type.
    fn evolve_sizing(&self, source: &Column, target: &Column) -> Column {
        let (mut length, mut scale) = (None, None);
        if self.sink.supports(Capability::DataSizingChanges) {
            let same_type = source.data_type == target.data_type;
            length = larger(source.length, target.length, same_type);
            scale = larger(source.scale, target.scale, same_type);
        }
        Column {
            length,
            scale,
            nullable: source.nullable || target.nullable,
            ..target.clone()
        }
    }

    /// Staging columns the planner consumes without writing them to main
    fn staging_only_fields(&self, main: &Dataset) -> BTreeSet<&'a str> {
        let mut fields = BTreeSet::new();
        if let Some(indicator) = self.mode.merge_strategy().and_then(|m| m.delete_indicator()) {
            fields.insert(indicator.delete_field.as_str());
        }
        fields.extend(self.mode.data_split_field());
        if let Some(validity) = self.mode.validity_milestoning() {
            let derivation = &validity.derivation;
            for field in [Some(derivation.source_from()), derivation.source_thru()]
                .into_iter()
                .flatten()
            {
                if !main.has_column(field) {
                    fields.insert(field);
                }
            }
        }
        fields
    }

    /// Main columns the planner fills itself
    fn main_only_fields(&self) -> BTreeSet<&'a str> {
        let mut fields = BTreeSet::new();
        if let Some(field) = self.mode.auditing().and_then(|a| a.field()) {
            fields.insert(field);
        }
        if let Some(milestoning) = self.mode.transaction_milestoning() {
            fields.extend(milestoning.fields());
        }
        if let Some(validity) = self.mode.validity_milestoning() {
            fields.insert(validity.date_time_from.as_str());
            fields.insert(validity.date_time_thru.as_str());
        }
        if let Some(field) = self.mode.deduplication().and_then(|d| d.count_field()) {
            fields.insert(field);
        }
        fields
    }
}

fn alter(table: &TableRef, kind: AlterKind, column: Column) -> Operation {
    Operation::Alter {
        table: table.clone(),
        kind,
        column,
    }
}

fn larger(source: Option<u32>, target: Option<u32>, same_type: bool) -> Option<u32> {
    match (source, target) {
        (Some(s), Some(t)) => Some(s.max(t)),
        (Some(s), None) if same_type => Some(s),
        _ => None,
    }
}

/// Main columns with every modified column replaced, new columns appended
fn evolved_dataset(main: &Dataset, modified: Vec<Column>) -> Dataset {
    let mut evolved = main.clone();
    for column in modified {
        match evolved.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => evolved.columns.push(column),
        }
    }
    evolved
}
