//! Dialect differences between sinks

mod common;

use common::{datasets, generator};
use ingest_planner::models::{AppendOnly, IngestMode, NontemporalDelta};
use ingest_planner::{Capability, SinkKind};

fn append_only() -> IngestMode {
    AppendOnly::builder().build().unwrap().into()
}

#[test]
fn test_capabilities() {
    assert!(!SinkKind::Ansi.sink().supports(Capability::Merge));
    assert!(SinkKind::Snowflake.sink().supports(Capability::Merge));
    assert!(SinkKind::H2.sink().supports(Capability::Merge));
    assert!(!SinkKind::Memsql.sink().supports(Capability::Merge));
    assert!(SinkKind::Ansi.sink().supports(Capability::AddColumn));
}

#[test]
fn test_memsql_quotes_with_backticks() {
    let result = generator(SinkKind::Memsql)
        .generate_operations(&append_only(), &datasets(vec![], vec![]))
        .unwrap();
    assert!(result.ingest_sql[0].starts_with("INSERT INTO `main` (`id`, `name`"));
    assert!(result.ingest_sql[0].contains("stage.`id`"));
}

#[test]
fn test_bigquery_create_marks_keys_not_enforced() {
    let result = generator(SinkKind::Bigquery)
        .generate_operations(&append_only(), &datasets(vec![], vec![]))
        .unwrap();
    assert!(result.pre_actions_sql[0].starts_with("CREATE TABLE IF NOT EXISTS `main`(`id` INT64 NOT NULL,"));
    assert!(result.pre_actions_sql[0].ends_with("PRIMARY KEY (`id`, `name`) NOT ENFORCED)"));
}

#[test]
fn test_snowflake_merges_and_ansi_does_not() {
    let mode: IngestMode = NontemporalDelta::builder()
        .digest_field("digest")
        .build()
        .unwrap()
        .into();
    let snowflake = generator(SinkKind::Snowflake)
        .generate_operations(&mode, &datasets(vec![], vec![]))
        .unwrap();
    assert_eq!(snowflake.ingest_sql.len(), 1);
    assert!(snowflake.ingest_sql[0].starts_with("MERGE INTO main as sink USING staging as stage"));

    let ansi = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets(vec![], vec![]))
        .unwrap();
    assert!(ansi.ingest_sql[0].starts_with("UPDATE main as sink"));
}

#[test]
fn test_sink_names_parse() {
    assert_eq!("snowflake".parse::<SinkKind>().unwrap(), SinkKind::Snowflake);
    assert_eq!("SingleStore".parse::<SinkKind>().unwrap(), SinkKind::Memsql);
    assert!("oracle".parse::<SinkKind>().is_err());
}
