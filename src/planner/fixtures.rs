//! Datasets and helpers shared by the planner tests

use chrono::{NaiveDate, NaiveDateTime};

use super::{IngestPlans, PlannerOptions};
use crate::logical_plan::LogicalPlan;
use crate::models::{CaseConversion, Column, DataType, Dataset, Datasets};
use crate::render::SqlRenderer;
use crate::sink::SinkKind;

pub(crate) fn execution_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

pub(crate) fn options() -> PlannerOptions {
    PlannerOptions::default().with_execution_timestamp(execution_timestamp())
}

/// `id`, `name`, `amount`, `biz_date`, `digest` with `(id, name)` as key
pub(crate) fn base_columns() -> Vec<Column> {
    vec![
        Column::new("id", DataType::Integer).primary_key(),
        Column::new("name", DataType::Varchar).primary_key(),
        Column::new("amount", DataType::Double),
        Column::new("biz_date", DataType::Date),
        Column::new("digest", DataType::Varchar),
    ]
}

pub(crate) fn datasets(main_extra: Vec<Column>, staging_extra: Vec<Column>) -> Datasets {
    let mut main = base_columns();
    main.extend(main_extra);
    let mut staging = base_columns();
    staging.extend(staging_extra);
    Datasets::new(
        Dataset::new("main").with_columns(main),
        Dataset::new("staging").with_columns(staging),
    )
}

pub(crate) fn batch_id_columns() -> Vec<Column> {
    vec![
        Column::new("batch_id_in", DataType::Integer).primary_key(),
        Column::new("batch_id_out", DataType::Integer),
    ]
}

pub(crate) fn render(plan: &LogicalPlan) -> Vec<String> {
    SqlRenderer::new(SinkKind::Ansi.sink(), CaseConversion::None)
        .render_plan(plan)
        .unwrap()
}

pub(crate) fn render_for(kind: SinkKind, plan: &LogicalPlan) -> Vec<String> {
    SqlRenderer::new(kind.sink(), CaseConversion::None)
        .render_plan(plan)
        .unwrap()
}

pub(crate) fn render_ingest(plans: &IngestPlans) -> Vec<String> {
    render(&plans.ingest)
}

/// Previous-batch lookup as rendered for a main table named `main`
pub(crate) const BATCH_ID: &str = "(SELECT COALESCE(MAX(batch_metadata.\"table_batch_id\"),0)+1 FROM batch_metadata as batch_metadata WHERE UPPER(batch_metadata.\"table_name\") = 'MAIN')";

/// Bitemporal main table with batch id milestoning and a target validity window
pub(crate) fn bitemporal_main_columns() -> Vec<Column> {
    vec![
        Column::new("id", DataType::Integer).primary_key(),
        Column::new("name", DataType::Varchar).primary_key(),
        Column::new("amount", DataType::Double),
        Column::new("digest", DataType::Varchar),
        Column::new("batch_id_in", DataType::Integer).primary_key(),
        Column::new("batch_id_out", DataType::Integer),
        Column::new("validity_from_target", DataType::Datetime).primary_key(),
        Column::new("validity_through_target", DataType::Datetime),
    ]
}

pub(crate) fn bitemporal_datasets(staging: Vec<Column>) -> Datasets {
    Datasets::new(
        Dataset::new("main").with_columns(bitemporal_main_columns()),
        Dataset::new("staging").with_columns(staging),
    )
}
