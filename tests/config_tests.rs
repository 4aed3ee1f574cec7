//! Job files and generator settings loaded from disk

use ingest_planner::config::{CONFIG_FILENAME, GeneratorSettings, JobConfig};
use ingest_planner::{CaseConversion, SinkKind};
use std::fs;
use tempfile::tempdir;

const JOB: &str = r#"
main:
  name: main
  columns:
    - { name: id, dataType: INTEGER, primaryKey: true }
    - { name: name, dataType: VARCHAR }
    - { name: digest, dataType: VARCHAR }
staging:
  name: staging
  columns:
    - { name: id, dataType: INTEGER, primaryKey: true }
    - { name: name, dataType: VARCHAR }
    - { name: digest, dataType: VARCHAR }
    - { name: deleted, dataType: VARCHAR }
ingestMode:
  type: nontemporalDelta
  digestField: digest
  mergeStrategy:
    type: deleteIndicator
    deleteField: deleted
    deleteValues: ["Y"]
"#;

#[test]
fn test_job_and_settings_drive_the_generator() {
    let dir = tempdir().unwrap();
    let job_path = dir.path().join("job.yaml");
    fs::write(&job_path, JOB).unwrap();
    fs::write(
        dir.path().join(CONFIG_FILENAME),
        "sink = \"snowflake\"\ncase_conversion = \"to_upper\"\ncleanup_staging_data = false\n\
         execution_timestamp = \"2000-01-01 00:00:00\"\n",
    )
    .unwrap();

    let job = JobConfig::load(&job_path).unwrap();
    let settings = GeneratorSettings::parse(
        &fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(settings.sink, SinkKind::Snowflake);
    assert_eq!(settings.case_conversion, CaseConversion::ToUpper);

    let result = settings
        .generator()
        .unwrap()
        .generate_operations(&job.ingest_mode, &job.datasets())
        .unwrap();
    assert!(result.ingest_sql[0].starts_with("MERGE INTO MAIN as SINK USING STAGING as STAGE"));
    assert!(result.post_actions_sql.is_empty());
    assert!(result.metadata_ingest_sql[0].contains("'2000-01-01 00:00:00'"));
}

#[test]
fn test_missing_settings_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let defaults = GeneratorSettings::default();
    let parsed = GeneratorSettings::parse("").unwrap();
    assert_eq!(parsed, defaults);
    assert!(!dir.path().join(CONFIG_FILENAME).exists());
}

#[test]
fn test_unknown_ingest_mode_is_rejected() {
    let yaml = JOB.replace("type: nontemporalDelta", "type: tritemporal");
    assert!(JobConfig::parse(&yaml).is_err());
}

#[test]
fn test_delete_indicator_without_values_is_rejected() {
    let yaml = JOB.replace("deleteValues: [\"Y\"]", "deleteValues: []");
    let err = JobConfig::parse(&yaml).unwrap_err();
    assert!(
        format!("{:#}", err).contains(
            "Cannot build DeleteIndicatorMergeStrategy, [deleteValues] must contain at least one element"
        )
    );
}

const DATASETS: &str = r#"
main:
  name: main
  columns:
    - { name: id, dataType: INTEGER, primaryKey: true }
staging:
  name: staging
  columns:
    - { name: id, dataType: INTEGER, primaryKey: true }
"#;

fn parse_error(ingest_mode: &str) -> String {
    let yaml = format!("{}ingestMode:\n{}", DATASETS, ingest_mode);
    format!("{:#}", JobConfig::parse(&yaml).unwrap_err())
}

#[test]
fn test_missing_digest_field_uses_builder_message() {
    let err = parse_error(
        "  type: unitemporalDelta\n  transactionMilestoning:\n    type: batchId\n    batchIdIn: batch_id_in\n    batchIdOut: batch_id_out\n",
    );
    assert!(
        err.contains("Cannot build UnitemporalDelta, some of required attributes are not set [digestField]"),
        "{}",
        err
    );
}

#[test]
fn test_missing_transaction_milestoning_uses_builder_message() {
    let err = parse_error("  type: unitemporalSnapshot\n  digestField: digest\n");
    assert!(
        err.contains(
            "Cannot build UnitemporalSnapshot, some of required attributes are not set [transactionMilestoning]"
        ),
        "{}",
        err
    );
}

#[test]
fn test_missing_attributes_are_listed_together() {
    let err = parse_error("  type: unitemporalDelta\n");
    assert!(
        err.contains(
            "Cannot build UnitemporalDelta, some of required attributes are not set [digestField, transactionMilestoning]"
        ),
        "{}",
        err
    );
}

#[test]
fn test_missing_validity_milestoning_uses_builder_message() {
    let err = parse_error(
        "  type: bitemporalDelta\n  digestField: digest\n  transactionMilestoning:\n    type: batchId\n    batchIdIn: batch_id_in\n    batchIdOut: batch_id_out\n",
    );
    assert!(
        err.contains(
            "Cannot build BitemporalDelta, some of required attributes are not set [validityMilestoning]"
        ),
        "{}",
        err
    );
}

#[test]
fn test_nontemporal_delta_requires_digest_field() {
    let err = parse_error("  type: nontemporalDelta\n");
    assert!(
        err.contains("Cannot build NontemporalDelta, some of required attributes are not set [digestField]"),
        "{}",
        err
    );
}

