//! Bitemporal snapshot and delta ingestion through the generator

mod common;

use common::{generator, options};
use ingest_planner::models::{
    BitemporalDelta, BitemporalSnapshot, Column, DataSplitRange, DataType, Dataset, Datasets,
    DeleteIndicator, IngestMode, TransactionMilestoning, ValidityDerivation, ValidityMilestoning,
};
use ingest_planner::{ConfigurationError, RelationalGenerator, SinkKind};

fn main_columns() -> Vec<Column> {
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

fn staging_columns(thru: bool, delete_indicator: bool) -> Vec<Column> {
    let mut columns = vec![
        Column::new("id", DataType::Integer).primary_key(),
        Column::new("name", DataType::Varchar).primary_key(),
        Column::new("amount", DataType::Double),
        Column::new("validity_from_reference", DataType::Datetime).primary_key(),
    ];
    if thru {
        columns.push(Column::new("validity_through_reference", DataType::Datetime));
    }
    columns.push(Column::new("digest", DataType::Varchar));
    if delete_indicator {
        columns.push(Column::new("delete_indicator", DataType::Varchar));
    }
    columns
}

fn datasets(staging: Vec<Column>) -> Datasets {
    Datasets::new(
        Dataset::new("main").with_columns(main_columns()),
        Dataset::new("staging").with_columns(staging),
    )
}

fn validity(derivation: ValidityDerivation) -> ValidityMilestoning {
    ValidityMilestoning::builder()
        .date_time_from("validity_from_target")
        .date_time_thru("validity_through_target")
        .derivation(derivation)
        .build()
        .unwrap()
}

fn from_and_thru() -> ValidityDerivation {
    ValidityDerivation::SourceSpecifiesFromAndThru {
        source_from: "validity_from_reference".to_string(),
        source_thru: "validity_through_reference".to_string(),
    }
}

fn from_only() -> ValidityDerivation {
    ValidityDerivation::SourceSpecifiesFrom {
        source_from: "validity_from_reference".to_string(),
    }
}

fn batch_id() -> TransactionMilestoning {
    TransactionMilestoning::batch_id("batch_id_in", "batch_id_out")
}

#[test]
fn test_snapshot_maps_source_validity() {
    let mode: IngestMode = BitemporalSnapshot::builder()
        .digest_field("digest")
        .transaction_milestoning(batch_id())
        .validity_milestoning(validity(from_and_thru()))
        .build()
        .unwrap()
        .into();
    let result = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets(staging_columns(true, false)))
        .unwrap();
    assert_eq!(result.ingest_sql.len(), 2);
    assert!(result.ingest_sql[1].contains(
        "stage.\"validity_from_reference\",stage.\"validity_through_reference\" FROM staging as stage"
    ));
}

#[test]
fn test_delta_from_and_thru_has_two_statements() {
    let mode: IngestMode = BitemporalDelta::builder()
        .digest_field("digest")
        .transaction_milestoning(batch_id())
        .validity_milestoning(validity(from_and_thru()))
        .build()
        .unwrap()
        .into();
    let result = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets(staging_columns(true, false)))
        .unwrap();
    assert_eq!(result.ingest_sql.len(), 2);
    assert_eq!(result.pre_actions_sql.len(), 2);
}

#[test]
fn test_delta_from_only_stitches_through_temp_tables() {
    let mode: IngestMode = BitemporalDelta::builder()
        .digest_field("digest")
        .transaction_milestoning(batch_id())
        .validity_milestoning(validity(from_only()))
        .merge_strategy(
            DeleteIndicator::builder()
                .delete_field("delete_indicator")
                .add_delete_values(["yes"])
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .into();
    let datasets = datasets(staging_columns(false, true));
    let result = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets)
        .unwrap();
    assert_eq!(result.pre_actions_sql.len(), 4);
    assert_eq!(result.ingest_sql.len(), 9);
    assert!(result.ingest_sql[0].starts_with("INSERT INTO main_temp ("));
    assert_eq!(result.ingest_sql[7], "DELETE FROM main_temp as temp");
    assert_eq!(
        result.ingest_sql[8],
        "DELETE FROM main_tempWithDeleteIndicator as tempWithDeleteIndicator"
    );

    let drops = generator(SinkKind::Ansi)
        .generate_drop_operations(&mode, &datasets)
        .unwrap();
    assert_eq!(
        drops,
        vec![
            "DROP TABLE IF EXISTS main",
            "DROP TABLE IF EXISTS batch_metadata",
            "DROP TABLE IF EXISTS main_temp",
            "DROP TABLE IF EXISTS main_tempWithDeleteIndicator",
        ]
    );
}

#[test]
fn test_custom_temp_table_names() {
    let mode: IngestMode = BitemporalDelta::builder()
        .digest_field("digest")
        .transaction_milestoning(batch_id())
        .validity_milestoning(validity(from_only()))
        .build()
        .unwrap()
        .into();
    let datasets = datasets(staging_columns(false, false)).with_temp_name("scratch");
    let result = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets)
        .unwrap();
    assert!(result.pre_actions_sql[2].starts_with("CREATE TABLE IF NOT EXISTS scratch("));
    assert_eq!(result.ingest_sql[4], "DELETE FROM scratch as temp");
}

#[test]
fn test_unique_temp_names_are_shared_across_splits_and_drops() {
    let mode: IngestMode = BitemporalDelta::builder()
        .digest_field("digest")
        .transaction_milestoning(batch_id())
        .validity_milestoning(validity(from_only()))
        .data_split_field("split")
        .build()
        .unwrap()
        .into();
    let mut staging = staging_columns(false, false);
    staging.push(Column::new("split", DataType::Integer));
    let datasets = datasets(staging);
    let generator = RelationalGenerator::new(SinkKind::Ansi)
        .with_options(options().with_unique_temp_table_names(true));

    let splits = generator
        .generate_operations_with_data_splits(
            &mode,
            &datasets,
            &[DataSplitRange::new(1, 1), DataSplitRange::new(2, 3)],
        )
        .unwrap();
    assert_eq!(splits.len(), 2);
    assert_eq!(splits[0].pre_actions_sql, splits[1].pre_actions_sql);

    let create = &splits[0].pre_actions_sql[2];
    let temp = create
        .strip_prefix("CREATE TABLE IF NOT EXISTS ")
        .and_then(|rest| rest.split('(').next())
        .unwrap()
        .to_string();
    assert!(temp.starts_with("main_temp_"));
    for split in &splits {
        assert!(split.ingest_sql[0].starts_with(&format!("INSERT INTO {} (", temp)));
    }

    let single = generator.generate_operations(&mode, &datasets).unwrap();
    assert_eq!(single.pre_actions_sql, splits[0].pre_actions_sql);

    let drops = generator.generate_drop_operations(&mode, &datasets).unwrap();
    assert_eq!(drops[2], format!("DROP TABLE IF EXISTS {}", temp));
}

#[test]
fn test_snapshot_requires_validity_milestoning() {
    let err = BitemporalSnapshot::builder()
        .digest_field("digest")
        .transaction_milestoning(batch_id())
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::MissingAttributes { .. }));
}
