//! Append-only ingestion through the generator

mod common;

use common::{BATCH_ID, COLUMNS, PK, VALUES, datasets, generator};
use ingest_planner::models::{AppendOnly, Auditing, Column, DataType, IngestMode};
use ingest_planner::{SinkKind, StatisticName};

fn plain() -> IngestMode {
    AppendOnly::builder().build().unwrap().into()
}

#[test]
fn test_full_batch() {
    let result = generator(SinkKind::Ansi)
        .generate_operations(&plain(), &datasets(vec![], vec![]))
        .unwrap();
    assert_eq!(
        result.pre_actions_sql[0],
        "CREATE TABLE IF NOT EXISTS main(\"id\" INTEGER NOT NULL,\"name\" VARCHAR NOT NULL,\
         \"amount\" DOUBLE,\"biz_date\" DATE,\"digest\" VARCHAR,PRIMARY KEY (\"id\", \"name\"))"
    );
    assert!(result.pre_actions_sql[1].starts_with("CREATE TABLE IF NOT EXISTS batch_metadata("));
    assert_eq!(
        result.ingest_sql,
        vec![format!("INSERT INTO main ({COLUMNS}) (SELECT {VALUES} FROM staging as stage)")]
    );
    assert_eq!(
        result.metadata_ingest_sql,
        vec![format!(
            "INSERT INTO batch_metadata (\"table_name\", \"table_batch_id\", \"batch_start_ts_utc\", \
             \"batch_end_ts_utc\", \"batch_status\") \
             (SELECT 'main',{BATCH_ID},'2000-01-01 00:00:00',CURRENT_TIMESTAMP(),'DONE')"
        )]
    );
    assert_eq!(result.post_actions_sql, vec!["DELETE FROM staging as stage"]);
}

#[test]
fn test_filter_duplicates_skips_known_digests() {
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
        vec![],
    );
    let result = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets)
        .unwrap();
    assert_eq!(
        result.ingest_sql,
        vec![format!(
            "INSERT INTO main ({COLUMNS}, \"batch_update_time\") \
             (SELECT {VALUES},'2000-01-01 00:00:00' FROM staging as stage WHERE NOT (EXISTS \
             (SELECT * FROM main as sink WHERE ({PK}) AND (sink.\"digest\" = stage.\"digest\"))))"
        )]
    );
}

#[test]
fn test_empty_batch_only_records_metadata() {
    let result = generator(SinkKind::Ansi)
        .generate_operations_for_empty_batch(&plain(), &datasets(vec![], vec![]))
        .unwrap();
    assert!(result.ingest_sql.is_empty());
    assert_eq!(result.metadata_ingest_sql.len(), 1);
}

#[test]
fn test_statistics_are_rendered_when_requested() {
    let generator = generator(SinkKind::Ansi)
        .with_options(common::options().with_collect_statistics(true));
    let result = generator
        .generate_operations(&plain(), &datasets(vec![], vec![]))
        .unwrap();
    assert_eq!(
        result.post_ingest_statistics_sql[&StatisticName::IncomingRecordCount],
        "SELECT COUNT(*) as \"incomingRecordCount\" FROM staging as stage"
    );
    assert!(result.pre_ingest_statistics_sql.is_empty());
}

#[test]
fn test_cleanup_can_be_disabled() {
    let generator = generator(SinkKind::Ansi)
        .with_options(common::options().with_cleanup_staging_data(false));
    let result = generator
        .generate_operations(&plain(), &datasets(vec![], vec![]))
        .unwrap();
    assert!(result.post_actions_sql.is_empty());
}
