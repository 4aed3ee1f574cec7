//! Batch metadata bookkeeping

use serde_json::{Map, Value as JsonValue};

use super::PlanContext;
use crate::logical_plan::{Operation, Selection, Value};
use crate::models::{Column, DataType, FilterValue, StagingFilter};

const BATCH_STATUS_DONE: &str = "DONE";

pub(super) fn create(ctx: &PlanContext) -> Operation {
    let metadata = &ctx.datasets.metadata;
    Operation::Create {
        table: ctx.metadata_table().unaliased(),
        columns: vec![
            Column::new(metadata.table_name_field.as_str(), DataType::Varchar).with_length(255),
            Column::new(metadata.batch_start_ts_field.as_str(), DataType::Datetime),
            Column::new(metadata.batch_end_ts_field.as_str(), DataType::Datetime),
            Column::new(metadata.batch_status_field.as_str(), DataType::Varchar).with_length(32),
            Column::new(metadata.table_batch_id_field.as_str(), DataType::Integer),
            Column::new(metadata.staging_filters_field.as_str(), DataType::Json),
        ],
        if_not_exists: true,
    }
}

/// Row recording the batch as done
pub(super) fn ingest(ctx: &PlanContext) -> Operation {
    let metadata = &ctx.datasets.metadata;
    let mut columns = vec![
        metadata.table_name_field.clone(),
        metadata.table_batch_id_field.clone(),
        metadata.batch_start_ts_field.clone(),
        metadata.batch_end_ts_field.clone(),
        metadata.batch_status_field.clone(),
    ];
    let mut values = vec![
        Value::string(ctx.datasets.main.name.as_str()),
        ctx.batch_id(),
        ctx.batch_start(),
        ctx.batch_end(),
        Value::string(BATCH_STATUS_DONE),
    ];
    let filters = &ctx.datasets.staging.filters;
    if !filters.is_empty() {
        columns.push(metadata.staging_filters_field.clone());
        values.push(Value::Json(staging_filters_json(filters)));
    }
    Operation::Insert {
        table: ctx.metadata_table().unaliased(),
        columns,
        source: Selection::values(values),
    }
}

/// `{"field":{"GT":5}}`, one entry per filtered field
fn staging_filters_json(filters: &[StagingFilter]) -> String {
    let mut by_field: Map<String, JsonValue> = Map::new();
    for filter in filters {
        let value = match &filter.value {
            FilterValue::Integer(v) => JsonValue::from(*v),
            FilterValue::Text(v) => JsonValue::from(v.as_str()),
        };
        let entry = by_field
            .entry(filter.field.clone())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if let JsonValue::Object(conditions) = entry {
            conditions.insert(filter.filter_type.to_string(), value);
        }
    }
    JsonValue::Object(by_field).to_string()
}

#[cfg(test)]
mod tests {
    use super::super::Planner;
    use super::super::fixtures::{BATCH_ID, datasets, options, render, render_for};
    use crate::logical_plan::LogicalPlan;
    use crate::models::{
        AppendOnly, Dataset, Datasets, FilterType, IngestMode, MetadataDataset, StagingFilter,
    };
    use crate::sink::SinkKind;

    fn append_only() -> IngestMode {
        AppendOnly::builder().build().unwrap().into()
    }

    #[test]
    fn test_metadata_ingest_records_done_batch() {
        let mode = append_only();
        let datasets = datasets(vec![], vec![]);
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        assert_eq!(
            render(&plans.metadata_ingest),
            vec![format!(
                "INSERT INTO batch_metadata (\"table_name\", \"table_batch_id\", \"batch_start_ts_utc\", \
                 \"batch_end_ts_utc\", \"batch_status\") \
                 (SELECT 'main',{BATCH_ID},'2000-01-01 00:00:00',CURRENT_TIMESTAMP(),'DONE')"
            )]
        );
    }

    #[test]
    fn test_metadata_table_is_created() {
        let mode = append_only();
        let datasets = datasets(vec![], vec![]);
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        let sql = render(&plans.pre_actions);
        assert_eq!(
            sql[1],
            "CREATE TABLE IF NOT EXISTS batch_metadata(\"table_name\" VARCHAR(255),\
             \"batch_start_ts_utc\" DATETIME,\"batch_end_ts_utc\" DATETIME,\"batch_status\" VARCHAR(32),\
             \"table_batch_id\" INTEGER,\"staging_filters\" JSON)"
        );
    }

    #[test]
    fn test_staging_filters_are_stored_as_json() {
        let mode = append_only();
        let base = datasets(vec![], vec![]);
        let staging = Dataset {
            filters: vec![
                StagingFilter::new("batch_id_in", FilterType::Gt, 5),
                StagingFilter::new("batch_id_in", FilterType::Lte, 10),
                StagingFilter::new("region", FilterType::Eq, "EMEA"),
            ],
            ..base.staging.clone()
        };
        let datasets = Datasets::new(base.main.clone(), staging);
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        let plan: &LogicalPlan = &plans.metadata_ingest;
        let sql = render_for(SinkKind::Snowflake, plan);
        assert!(sql[0].contains("\"batch_status\", \"staging_filters\")"));
        assert!(sql[0].ends_with(
            "'DONE',PARSE_JSON('{\"batch_id_in\":{\"GT\":5,\"LTE\":10},\"region\":{\"EQ\":\"EMEA\"}}'))"
        ));
    }

    #[test]
    fn test_custom_metadata_table() {
        let mode = append_only();
        let datasets = datasets(vec![], vec![]).with_metadata(MetadataDataset {
            database: Some("ops".to_string()),
            name: "batches".to_string(),
            ..MetadataDataset::default()
        });
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        let sql = render(&plans.metadata_ingest);
        assert!(sql[0].starts_with("INSERT INTO \"ops\".\"batches\" (\"table_name\""));
        assert!(sql[0].contains(
            "FROM \"ops\".\"batches\" as batch_metadata WHERE UPPER(batch_metadata.\"table_name\") = 'MAIN'"
        ));
    }
}
