//! Append-only ingestion: one INSERT of every staged row

use super::PlanContext;
use crate::logical_plan::{Condition, Operation, Selection};
use crate::models::AppendOnly;

pub(super) fn ingest(ctx: &PlanContext, mode: &AppendOnly) -> Vec<Operation> {
    let staging = ctx.staging_source(false);
    let duplicates = mode.filter_duplicates.then(|| {
        Condition::not_exists(
            Selection::all_from(ctx.main.clone())
                .filter(Condition::and_opt(vec![ctx.pk_match(), ctx.digest_matches()])),
        )
    });
    vec![ctx.insert_into_main(staging, ctx.audit().into_iter().collect(), vec![duplicates])]
}

#[cfg(test)]
mod tests {
    use super::super::Planner;
    use super::super::fixtures::{datasets, options, render_ingest};
    use crate::models::{
        AppendOnly, Auditing, Column, DataSplitRange, DataType, FilterType, IngestMode,
        StagingFilter,
    };

    #[test]
    fn test_plain_insert() {
        let mode: IngestMode = AppendOnly::builder().build().unwrap().into();
        let datasets = datasets(Vec::new(), Vec::new());
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        assert_eq!(
            render_ingest(&plans),
            vec![
                "INSERT INTO main (\"id\", \"name\", \"amount\", \"biz_date\", \"digest\") \
                 (SELECT stage.\"id\",stage.\"name\",stage.\"amount\",stage.\"biz_date\",stage.\"digest\" FROM staging as stage)"
            ]
        );
    }

    #[test]
    fn test_filter_duplicates_with_auditing() {
        let mode: IngestMode = AppendOnly::builder()
            .digest_field("digest")
            .filter_duplicates(true)
            .auditing(
                Auditing::date_time()
                    .date_time_field("batch_update_time")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
            .into();
        let datasets = datasets(
            vec![Column::new("batch_update_time", DataType::Datetime)],
            Vec::new(),
        );
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        assert_eq!(
            render_ingest(&plans),
            vec![
                "INSERT INTO main (\"id\", \"name\", \"amount\", \"biz_date\", \"digest\", \"batch_update_time\") \
                 (SELECT stage.\"id\",stage.\"name\",stage.\"amount\",stage.\"biz_date\",stage.\"digest\",'2000-01-01 00:00:00' \
                 FROM staging as stage WHERE NOT (EXISTS (SELECT * FROM main as sink \
                 WHERE ((sink.\"id\" = stage.\"id\") AND (sink.\"name\" = stage.\"name\")) AND (sink.\"digest\" = stage.\"digest\"))))"
            ]
        );
    }

    #[test]
    fn test_data_split_and_filters_gate_staging() {
        let mode: IngestMode = AppendOnly::builder()
            .data_split_field("data_split")
            .build()
            .unwrap()
            .into();
        let mut datasets = datasets(
            Vec::new(),
            vec![Column::new("data_split", DataType::Bigint)],
        );
        datasets.staging = datasets
            .staging
            .with_filter(StagingFilter::new("biz_date", FilterType::Gte, "2020-01-01"));
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options)
            .with_data_split(DataSplitRange::new(1, 1))
            .plan();
        assert_eq!(
            render_ingest(&plans),
            vec![
                "INSERT INTO main (\"id\", \"name\", \"amount\", \"biz_date\", \"digest\") \
                 (SELECT stage.\"id\",stage.\"name\",stage.\"amount\",stage.\"biz_date\",stage.\"digest\" FROM staging as stage \
                 WHERE (stage.\"biz_date\" >= '2020-01-01') AND ((stage.\"data_split\" >= 1) AND (stage.\"data_split\" <= 1)))"
            ]
        );
    }
}
