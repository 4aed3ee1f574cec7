//! Validate, plan and render an ingestion in one call
//!
//! [`RelationalGenerator`] is the entry point most callers need: it checks
//! the datasets and ingest mode, optionally evolves the main schema, plans
//! the batch and renders every statement group for the chosen sink.
//!
//! # Example
//!
//! ```
//! use ingest_planner::generator::RelationalGenerator;
//! use ingest_planner::models::{AppendOnly, Column, DataType, Dataset, Datasets, IngestMode};
//! use ingest_planner::sink::SinkKind;
//!
//! let columns = vec![
//!     Column::new("id", DataType::Integer).primary_key(),
//!     Column::new("name", DataType::Varchar),
//! ];
//! let datasets = Datasets::new(
//!     Dataset::new("main").with_columns(columns.clone()),
//!     Dataset::new("staging").with_columns(columns),
//! );
//! let mode: IngestMode = AppendOnly::builder().build().unwrap().into();
//!
//! let result = RelationalGenerator::new(SinkKind::Ansi)
//!     .generate_operations(&mode, &datasets)
//!     .unwrap();
//! assert_eq!(
//!     result.ingest_sql,
//!     vec!["INSERT INTO main (\"id\", \"name\") (SELECT stage.\"id\",stage.\"name\" FROM staging as stage)"]
//! );
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::IngestError;
use crate::logical_plan::{LogicalPlan, Selection};
use crate::models::{CaseConversion, DataSplitRange, Dataset, Datasets, IngestMode, StatisticName};
use crate::planner::{IngestPlans, Planner, PlannerOptions};
use crate::render::SqlRenderer;
use crate::schema_evolution::SchemaEvolution;
use crate::sink::{Capability, SinkKind};
use crate::validation::{IngestModeValidator, validate_datasets};

/// Rendered SQL for one batch, grouped by when it runs
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorResult {
    pub pre_actions_sql: Vec<String>,
    pub schema_evolution_sql: Vec<String>,
    pub ingest_sql: Vec<String>,
    pub post_actions_sql: Vec<String>,
    pub pre_ingest_statistics_sql: BTreeMap<StatisticName, String>,
    pub post_ingest_statistics_sql: BTreeMap<StatisticName, String>,
    pub metadata_ingest_sql: Vec<String>,
    /// Main dataset after schema evolution, when evolution is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_evolution_dataset: Option<Dataset>,
}

/// Generates ingestion SQL for a sink
#[derive(Debug, Clone, Default)]
pub struct RelationalGenerator {
    sink: SinkKind,
    case_conversion: CaseConversion,
    options: PlannerOptions,
    enable_schema_evolution: bool,
}

/// Datasets to plan against, after any schema evolution
#[derive(Clone)]
struct Prepared {
    datasets: Datasets,
    schema_evolution_sql: Vec<String>,
    schema_evolution_dataset: Option<Dataset>,
}

impl RelationalGenerator {
    pub fn new(sink: SinkKind) -> Self {
        Self {
            sink,
            ..Default::default()
        }
    }

    pub fn with_case_conversion(mut self, case_conversion: CaseConversion) -> Self {
        self.case_conversion = case_conversion;
        self
    }

    pub fn with_options(mut self, options: PlannerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_schema_evolution(mut self, enabled: bool) -> Self {
        self.enable_schema_evolution = enabled;
        self
    }

    pub fn sink(&self) -> SinkKind {
        self.sink
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// SQL for ingesting the staged batch
    pub fn generate_operations(
        &self,
        mode: &IngestMode,
        datasets: &Datasets,
    ) -> Result<GeneratorResult, IngestError> {
        let prepared = self.prepare(mode, datasets)?;
        let plans = self.planner(mode, &prepared.datasets).plan();
        self.finish(plans, prepared)
    }

    /// One result per data split range, each ingesting only its slice of staging
    pub fn generate_operations_with_data_splits(
        &self,
        mode: &IngestMode,
        datasets: &Datasets,
        ranges: &[DataSplitRange],
    ) -> Result<Vec<GeneratorResult>, IngestError> {
        let prepared = self.prepare(mode, datasets)?;
        ranges
            .iter()
            .map(|range| {
                debug!(lower = range.lower, upper = range.upper, "Generating data split");
                let plans = self
                    .planner(mode, &prepared.datasets)
                    .with_data_split(*range)
                    .plan();
                self.finish(plans, prepared.clone())
            })
            .collect()
    }

    /// SQL for a batch in which nothing was staged
    pub fn generate_operations_for_empty_batch(
        &self,
        mode: &IngestMode,
        datasets: &Datasets,
    ) -> Result<GeneratorResult, IngestError> {
        let prepared = self.prepare(mode, datasets)?;
        let plans = self.planner(mode, &prepared.datasets).plan_empty_batch();
        self.finish(plans, prepared)
    }

    /// `DROP TABLE IF EXISTS` for every table the ingestion creates
    pub fn generate_drop_operations(
        &self,
        mode: &IngestMode,
        datasets: &Datasets,
    ) -> Result<Vec<String>, IngestError> {
        validate_datasets(datasets)?;
        let plan = self.planner(mode, datasets).plan_drop();
        self.render(&plan)
    }

    fn prepare(&self, mode: &IngestMode, datasets: &Datasets) -> Result<Prepared, IngestError> {
        validate_datasets(datasets)?;
        let mut prepared = Prepared {
            datasets: datasets.clone(),
            schema_evolution_sql: Vec::new(),
            schema_evolution_dataset: None,
        };
        if self.enable_schema_evolution {
            let evolution = SchemaEvolution::new(self.sink.sink(), mode)
                .evolve(&datasets.main, &datasets.staging)?;
            prepared.schema_evolution_sql = self.render(&evolution.plan)?;
            prepared.datasets.main = evolution.evolved_dataset.clone();
            prepared.schema_evolution_dataset = Some(evolution.evolved_dataset);
        }
        IngestModeValidator::new().validate(mode, &prepared.datasets)?;
        Ok(prepared)
    }

    fn planner<'a>(&'a self, mode: &'a IngestMode, datasets: &'a Datasets) -> Planner<'a> {
        Planner::new(mode, datasets, &self.options)
            .with_merge(self.sink.sink().supports(Capability::Merge))
    }

    fn finish(&self, plans: IngestPlans, prepared: Prepared) -> Result<GeneratorResult, IngestError> {
        let result = GeneratorResult {
            pre_actions_sql: self.render(&plans.pre_actions)?,
            schema_evolution_sql: prepared.schema_evolution_sql,
            ingest_sql: self.render(&plans.ingest)?,
            post_actions_sql: self.render(&plans.post_actions)?,
            pre_ingest_statistics_sql: self.render_statistics(&plans.pre_ingest_statistics)?,
            post_ingest_statistics_sql: self.render_statistics(&plans.post_ingest_statistics)?,
            metadata_ingest_sql: self.render(&plans.metadata_ingest)?,
            schema_evolution_dataset: prepared.schema_evolution_dataset,
        };
        info!(
            sink = %self.sink,
            main = %prepared.datasets.main.name,
            ingest_statements = result.ingest_sql.len(),
            "Generated ingestion SQL"
        );
        Ok(result)
    }

    fn renderer(&self) -> SqlRenderer<'static> {
        SqlRenderer::new(self.sink.sink(), self.case_conversion)
    }

    fn render(&self, plan: &LogicalPlan) -> Result<Vec<String>, IngestError> {
        Ok(self.renderer().render_plan(plan)?)
    }

    fn render_statistics(
        &self,
        statistics: &BTreeMap<StatisticName, Selection>,
    ) -> Result<BTreeMap<StatisticName, String>, IngestError> {
        let renderer = self.renderer();
        statistics
            .iter()
            .map(|(name, selection)| Ok((*name, renderer.selection(selection)?)))
            .collect()
    }
}
