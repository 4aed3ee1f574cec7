//! Dataset and ingest mode validation surfaced by the generator

mod common;

use common::{batch_id_columns, datasets, generator};
use ingest_planner::models::{
    Column, DataType, Dataset, Datasets, IngestMode, NontemporalDelta, TransactionMilestoning,
    UnitemporalDelta,
};
use ingest_planner::{IdentifierError, IngestError, SchemaError, SinkKind};

fn nontemporal_delta() -> IngestMode {
    NontemporalDelta::builder()
        .digest_field("digest")
        .build()
        .unwrap()
        .into()
}

#[test]
fn test_injected_column_name_is_rejected() {
    let mut datasets = datasets(vec![], vec![]);
    datasets
        .staging
        .columns
        .push(Column::new("x\"; DROP TABLE main; --", DataType::Varchar));
    let err = generator(SinkKind::Ansi)
        .generate_operations(&nontemporal_delta(), &datasets)
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Identifier(IdentifierError::InvalidCharacters { field: "column name", .. })
    ));
}

#[test]
fn test_delta_needs_primary_keys() {
    let columns = vec![
        Column::new("id", DataType::Integer),
        Column::new("digest", DataType::Varchar),
    ];
    let datasets = Datasets::new(
        Dataset::new("main").with_columns(columns.clone()),
        Dataset::new("staging").with_columns(columns),
    );
    let err = generator(SinkKind::Ansi)
        .generate_operations(&nontemporal_delta(), &datasets)
        .unwrap_err();
    assert_eq!(err, IngestError::Schema(SchemaError::EmptyPrimaryKeys));
}

#[test]
fn test_digest_must_be_staged() {
    let mode: IngestMode = NontemporalDelta::builder()
        .digest_field("hash")
        .build()
        .unwrap()
        .into();
    let err = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets(vec![], vec![]))
        .unwrap_err();
    assert_eq!(err.to_string(), "Digest field [hash] not found in staging dataset");
}

#[test]
fn test_batch_id_in_must_be_a_primary_key() {
    let mode: IngestMode = UnitemporalDelta::builder()
        .digest_field("digest")
        .transaction_milestoning(TransactionMilestoning::batch_id("batch_id_in", "batch_id_out"))
        .build()
        .unwrap()
        .into();
    let main_extra = batch_id_columns()
        .into_iter()
        .map(|mut c| {
            c.primary_key = false;
            c
        })
        .collect();
    let err = generator(SinkKind::Ansi)
        .generate_operations(&mode, &datasets(main_extra, vec![]))
        .unwrap_err();
    assert_eq!(
        err,
        IngestError::Schema(SchemaError::NotPrimaryKey("batch_id_in".to_string()))
    );
}
