//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use ingest_planner::models::{Column, DataType, Dataset, Datasets};
use ingest_planner::{PlannerOptions, RelationalGenerator, SinkKind};

/// Next batch id as looked up for a main table named `main`
pub const BATCH_ID: &str = "(SELECT COALESCE(MAX(batch_metadata.\"table_batch_id\"),0)+1 FROM batch_metadata as batch_metadata WHERE UPPER(batch_metadata.\"table_name\") = 'MAIN')";

pub const COLUMNS: &str = "\"id\", \"name\", \"amount\", \"biz_date\", \"digest\"";
pub const VALUES: &str =
    "stage.\"id\",stage.\"name\",stage.\"amount\",stage.\"biz_date\",stage.\"digest\"";
pub const PK: &str = "(sink.\"id\" = stage.\"id\") AND (sink.\"name\" = stage.\"name\")";

pub fn execution_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

pub fn options() -> PlannerOptions {
    PlannerOptions::default().with_execution_timestamp(execution_timestamp())
}

pub fn generator(sink: SinkKind) -> RelationalGenerator {
    RelationalGenerator::new(sink).with_options(options())
}

/// `id`, `name`, `amount`, `biz_date`, `digest` keyed on `(id, name)`
pub fn base_columns() -> Vec<Column> {
    vec![
        Column::new("id", DataType::Integer).primary_key(),
        Column::new("name", DataType::Varchar).primary_key(),
        Column::new("amount", DataType::Double),
        Column::new("biz_date", DataType::Date),
        Column::new("digest", DataType::Varchar),
    ]
}

pub fn datasets(main_extra: Vec<Column>, staging_extra: Vec<Column>) -> Datasets {
    let mut main = base_columns();
    main.extend(main_extra);
    let mut staging = base_columns();
    staging.extend(staging_extra);
    Datasets::new(
        Dataset::new("main").with_columns(main),
        Dataset::new("staging").with_columns(staging),
    )
}

pub fn batch_id_columns() -> Vec<Column> {
    vec![
        Column::new("batch_id_in", DataType::Integer).primary_key(),
        Column::new("batch_id_out", DataType::Integer),
    ]
}
