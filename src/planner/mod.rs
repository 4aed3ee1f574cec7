//! Ingestion planner
//!
//! Turns a validated [`IngestMode`] and its [`Datasets`] into the logical
//! plans run around a batch: pre-actions, the ingest itself, post-actions,
//! metadata bookkeeping and statistics queries. Each mode lives in its own
//! submodule; shared predicates and values are in [`common`].
//!
//! Planning is pure: the same inputs always give the same plans.

mod append_only;
mod bitemporal;
mod common;
#[cfg(test)]
mod fixtures;
mod from_only;
mod metadata;
mod nontemporal;
mod statistics;
mod unitemporal;

use chrono::{NaiveDateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::logical_plan::{LogicalPlan, Operation, Selection, TableRef};
use crate::models::{DataSplitRange, Datasets, IngestMode, StatisticName};

pub(crate) use common::PlanContext;

/// Batch id of rows that are still open
pub const INFINITE_BATCH_ID: i64 = 999_999_999;
/// Timestamp of rows that are still open
pub const INFINITE_TIMESTAMP: &str = "9999-12-31 23:59:59";

/// Knobs that change the generated plans without changing the ingest mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerOptions {
    /// Delete staging rows once they are ingested
    pub cleanup_staging_data: bool,
    /// Emit statistics queries
    pub collect_statistics: bool,
    /// Create the staging table in the pre-actions
    pub create_staging_dataset: bool,
    /// Suffix appended to default temp table names, shared by every plan
    /// built from these options
    pub temp_table_suffix: Option<String>,
    /// Placeholder used instead of the metadata lookup for the batch id
    pub batch_id_pattern: Option<String>,
    pub batch_start_timestamp_pattern: Option<String>,
    pub batch_end_timestamp_pattern: Option<String>,
    /// Batch start time, used when no start pattern is set
    pub execution_timestamp: NaiveDateTime,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            cleanup_staging_data: true,
            collect_statistics: false,
            create_staging_dataset: false,
            temp_table_suffix: None,
            batch_id_pattern: None,
            batch_start_timestamp_pattern: None,
            batch_end_timestamp_pattern: None,
            execution_timestamp: Utc::now().naive_utc(),
        }
    }
}

impl PlannerOptions {
    pub fn with_execution_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.execution_timestamp = timestamp;
        self
    }

    pub fn with_cleanup_staging_data(mut self, cleanup: bool) -> Self {
        self.cleanup_staging_data = cleanup;
        self
    }

    pub fn with_collect_statistics(mut self, collect: bool) -> Self {
        self.collect_statistics = collect;
        self
    }

    pub fn with_create_staging_dataset(mut self, create: bool) -> Self {
        self.create_staging_dataset = create;
        self
    }

    /// Suffix default temp table names with a random id
    ///
    /// The id is drawn here, once, so data splits and drops built from the
    /// same options all name the same temp tables.
    pub fn with_unique_temp_table_names(mut self, unique: bool) -> Self {
        self.temp_table_suffix = unique.then(|| Uuid::new_v4().simple().to_string());
        self
    }

    pub fn with_batch_id_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.batch_id_pattern = Some(pattern.into());
        self
    }

    pub fn with_batch_start_timestamp_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.batch_start_timestamp_pattern = Some(pattern.into());
        self
    }

    pub fn with_batch_end_timestamp_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.batch_end_timestamp_pattern = Some(pattern.into());
        self
    }
}

/// Logical plans for one batch (or one data split of a batch)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestPlans {
    pub pre_actions: LogicalPlan,
    pub ingest: LogicalPlan,
    pub post_actions: LogicalPlan,
    pub metadata_ingest: LogicalPlan,
    /// Queries to run before the ingest statements
    pub pre_ingest_statistics: BTreeMap<StatisticName, Selection>,
    /// Queries to run after the ingest statements
    pub post_ingest_statistics: BTreeMap<StatisticName, Selection>,
}

/// Builds [`IngestPlans`] for an ingest mode
#[derive(Debug, Clone)]
pub struct Planner<'a> {
    ctx: PlanContext<'a>,
}

impl<'a> Planner<'a> {
    pub fn new(mode: &'a IngestMode, datasets: &'a Datasets, options: &'a PlannerOptions) -> Self {
        Self {
            ctx: PlanContext::new(mode, datasets, options, None),
        }
    }

    /// Plan a single MERGE where a mode can use one
    pub fn with_merge(mut self, supported: bool) -> Self {
        self.ctx.merge = supported;
        self
    }

    /// Restrict the staging rows to one data split
    pub fn with_data_split(mut self, range: DataSplitRange) -> Self {
        self.ctx.split = Some(range);
        self
    }

    /// Plans for ingesting the staged batch
    pub fn plan(&self) -> IngestPlans {
        let ctx = &self.ctx;
        let ingest = match ctx.mode {
            IngestMode::AppendOnly(mode) => append_only::ingest(ctx, mode),
            IngestMode::NontemporalSnapshot(mode) => nontemporal::snapshot(ctx, mode),
            IngestMode::NontemporalDelta(mode) => nontemporal::delta(ctx, mode),
            IngestMode::UnitemporalSnapshot(mode) => unitemporal::snapshot(ctx, mode),
            IngestMode::UnitemporalDelta(mode) => unitemporal::delta(ctx, mode),
            IngestMode::BitemporalSnapshot(mode) => bitemporal::snapshot(ctx, mode),
            IngestMode::BitemporalDelta(mode) if mode.is_source_from_only() => {
                from_only::ingest(ctx, mode)
            }
            IngestMode::BitemporalDelta(mode) => bitemporal::delta(ctx, mode),
        };
        tracing::debug!(
            mode = ctx.mode.name(),
            operations = ingest.len(),
            split = ?ctx.split,
            "Planned ingest"
        );
        self.assemble(LogicalPlan::new(ingest))
    }

    /// Plans for a batch with no staged rows
    ///
    /// Snapshot modes still close or delete what the empty snapshot no
    /// longer contains; the other modes only record the batch.
    pub fn plan_empty_batch(&self) -> IngestPlans {
        let ctx = &self.ctx;
        let ingest = match ctx.mode {
            IngestMode::NontemporalSnapshot(mode) => nontemporal::snapshot_empty_batch(ctx, mode),
            IngestMode::UnitemporalSnapshot(mode) => unitemporal::snapshot_empty_batch(ctx, mode),
            IngestMode::BitemporalSnapshot(mode) => bitemporal::snapshot_empty_batch(ctx, mode),
            IngestMode::AppendOnly(_)
            | IngestMode::NontemporalDelta(_)
            | IngestMode::UnitemporalDelta(_)
            | IngestMode::BitemporalDelta(_) => Vec::new(),
        };
        tracing::debug!(
            mode = ctx.mode.name(),
            operations = ingest.len(),
            "Planned empty batch"
        );
        self.assemble(LogicalPlan::new(ingest))
    }

    /// `DROP TABLE IF EXISTS` for every table the plans create
    pub fn plan_drop(&self) -> LogicalPlan {
        let drops = self
            .created_tables()
            .into_iter()
            .map(|table| Operation::Drop {
                table: table.unaliased(),
                if_exists: true,
            })
            .collect();
        LogicalPlan::new(drops)
    }

    fn assemble(&self, ingest: LogicalPlan) -> IngestPlans {
        let ctx = &self.ctx;
        let (pre_ingest_statistics, post_ingest_statistics) = if ctx.options.collect_statistics {
            (statistics::pre_ingest(ctx), statistics::post_ingest(ctx))
        } else {
            (BTreeMap::new(), BTreeMap::new())
        };
        IngestPlans {
            pre_actions: self.pre_actions(),
            ingest,
            post_actions: self.post_actions(),
            metadata_ingest: LogicalPlan::new(vec![metadata::ingest(ctx)]),
            pre_ingest_statistics,
            post_ingest_statistics,
        }
    }

    fn pre_actions(&self) -> LogicalPlan {
        let ctx = &self.ctx;
        let mut operations = vec![Operation::Create {
            table: ctx.main.unaliased(),
            columns: ctx.datasets.main.columns.clone(),
            if_not_exists: true,
        }];
        if ctx.options.create_staging_dataset {
            operations.push(Operation::Create {
                table: ctx.staging.unaliased(),
                columns: ctx.datasets.staging.columns.clone(),
                if_not_exists: true,
            });
        }
        operations.push(metadata::create(ctx));
        if let IngestMode::BitemporalDelta(mode) = ctx.mode
            && mode.is_source_from_only()
        {
            operations.extend(from_only::create_temp_tables(ctx, mode));
        }
        LogicalPlan::new(operations)
    }

    fn post_actions(&self) -> LogicalPlan {
        let ctx = &self.ctx;
        let mut operations = Vec::new();
        if ctx.options.cleanup_staging_data {
            operations.push(Operation::Delete {
                table: ctx.staging.clone(),
                condition: None,
            });
        }
        LogicalPlan::new(operations)
    }

    fn created_tables(&self) -> Vec<TableRef> {
        let ctx = &self.ctx;
        let mut tables = vec![ctx.main.clone()];
        if ctx.options.create_staging_dataset {
            tables.push(ctx.staging.clone());
        }
        tables.push(ctx.metadata_table());
        if let IngestMode::BitemporalDelta(mode) = ctx.mode
            && mode.is_source_from_only()
        {
            tables.push(ctx.temp_table());
            if mode.merge_strategy.delete_indicator().is_some() {
                tables.push(ctx.temp_with_delete_indicator_table());
            }
        }
        tables
    }
}
