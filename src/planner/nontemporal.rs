//! Nontemporal snapshot and delta ingestion
//!
//! Main holds only the latest state of each row. A snapshot replaces the
//! table contents (or the partitions present in staging); a delta upserts
//! staged rows by primary key and optionally deletes rows marked deleted.

use super::PlanContext;
use super::common::{StagingSource, key_match};
use crate::logical_plan::{Condition, FieldRef, Merge, Operation, Selection, Value};
use crate::models::{NontemporalDelta, NontemporalSnapshot};

pub(super) fn snapshot(ctx: &PlanContext, mode: &NontemporalSnapshot) -> Vec<Operation> {
    let staged = |condition: Option<Condition>| {
        Selection::all_from(ctx.staging.clone())
            .filter(Condition::and_opt(vec![ctx.staging_conditions(), condition]))
    };
    let digest_gone = ctx
        .digest_matches()
        .map(|digest| Condition::not_exists(staged(Some(digest))));
    let partition_present = key_match(
        &partition_fields(mode),
        ctx.main_alias(),
        ctx.stage_alias(),
    )
    .map(|partitions| Condition::exists(staged(Some(partitions))));
    let delete = Operation::Delete {
        table: ctx.main.clone(),
        condition: Condition::and_opt(vec![digest_gone, partition_present]),
    };

    let digest_new = ctx.digest_matches().map(|digest| {
        Condition::not_exists(Selection::all_from(ctx.main.clone()).filter(Some(digest)))
    });
    let insert = ctx.insert_into_main(
        ctx.staging_source(false),
        ctx.audit().into_iter().collect(),
        vec![digest_new],
    );
    vec![delete, insert]
}

/// An empty snapshot leaves main empty
pub(super) fn snapshot_empty_batch(ctx: &PlanContext, _mode: &NontemporalSnapshot) -> Vec<Operation> {
    vec![Operation::Delete {
        table: ctx.main.clone(),
        condition: None,
    }]
}

fn partition_fields(mode: &NontemporalSnapshot) -> Vec<&str> {
    mode.partition_fields.iter().map(String::as_str).collect()
}

pub(super) fn delta(ctx: &PlanContext, _mode: &NontemporalDelta) -> Vec<Operation> {
    let mut operations = match ctx.pk_match() {
        Some(on) if ctx.merge => vec![merge(ctx, on)],
        _ => update_then_insert(ctx),
    };
    if ctx.delete_indicator().is_some() {
        let staging = ctx.staging_source(false);
        let marked = Condition::and_opt(vec![
            staging.condition,
            ctx.pk_match(),
            ctx.digest_matches(),
            ctx.delete_marked(),
        ]);
        operations.push(Operation::Delete {
            table: ctx.main.clone(),
            condition: Some(Condition::exists(
                Selection::all_from(staging.source).filter(marked),
            )),
        });
    }
    operations
}

fn merge(ctx: &PlanContext, on: Condition) -> Operation {
    let fields = ctx.data_fields();
    let audit = ctx.audit();
    let mut assignments: Vec<(FieldRef, Value)> = fields
        .iter()
        .map(|f| (ctx.main_field_ref(f), ctx.stage_field(f)))
        .collect();
    let mut insert_columns: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    let mut insert_values: Vec<Value> = fields.iter().map(|f| ctx.stage_field(f)).collect();
    if let Some((column, value)) = audit {
        assignments.push((ctx.main_field_ref(column), value.clone()));
        insert_columns.push(column.to_string());
        insert_values.push(value);
    }
    Operation::Merge(Box::new(Merge {
        target: ctx.main.clone(),
        source: ctx.staging_source(true).source,
        on,
        matched_condition: Condition::and_opt(vec![ctx.changed(), ctx.delete_not_marked()]),
        assignments,
        not_matched_condition: ctx.delete_not_marked(),
        insert_columns,
        insert_values,
    }))
}

fn update_then_insert(ctx: &PlanContext) -> Vec<Operation> {
    let staging = ctx.staging_source(false);
    let matched = Condition::and_opt(vec![
        staging.condition.clone(),
        ctx.pk_match(),
        ctx.changed(),
        ctx.delete_not_marked(),
    ]);
    let lookup = |value: Value| {
        Value::subquery(Selection::from(staging.source.clone(), vec![value]).filter(matched.clone()))
    };
    let mut assignments: Vec<(FieldRef, Value)> = ctx
        .data_fields()
        .into_iter()
        .map(|f| (ctx.main_field_ref(f), lookup(ctx.stage_field(f))))
        .collect();
    if let Some((column, value)) = ctx.audit() {
        assignments.push((ctx.main_field_ref(column), value));
    }
    let update = Operation::Update {
        table: ctx.main.clone(),
        assignments,
        condition: Some(Condition::exists(
            Selection::all_from(staging.source.clone()).filter(matched.clone()),
        )),
    };
    vec![update, insert_missing(ctx, staging)]
}

/// INSERT of staged rows with no current counterpart in main
///
/// Under max-version deduplication any row with the same key counts as a
/// counterpart, since the UPDATE has already applied newer versions.
fn insert_missing(ctx: &PlanContext, staging: StagingSource) -> Operation {
    let counterpart = if ctx.version_newer().is_some() {
        ctx.pk_match()
    } else {
        Condition::and_opt(vec![ctx.pk_match(), ctx.digest_matches()])
    };
    let missing = Condition::not_exists(Selection::all_from(ctx.main.clone()).filter(counterpart));
    ctx.insert_into_main(
        staging,
        ctx.audit().into_iter().collect(),
        vec![Some(missing), ctx.delete_not_marked()],
    )
}

#[cfg(test)]
mod tests {
    use super::super::Planner;
    use super::super::fixtures::{datasets, options, render, render_for, render_ingest};
    use crate::models::{
        Auditing, Column, DataType, Deduplication, DeleteIndicator, IngestMode, MaxVersion,
        NontemporalDelta, NontemporalSnapshot, VersionResolver,
    };
    use crate::sink::SinkKind;

    const COLUMNS: &str = "\"id\", \"name\", \"amount\", \"biz_date\", \"digest\"";
    const VALUES: &str =
        "stage.\"id\",stage.\"name\",stage.\"amount\",stage.\"biz_date\",stage.\"digest\"";
    const PK: &str = "(sink.\"id\" = stage.\"id\") AND (sink.\"name\" = stage.\"name\")";

    fn audit() -> Auditing {
        Auditing::date_time()
            .date_time_field("batch_update_time")
            .build()
            .unwrap()
    }

    fn delete_indicator() -> crate::models::MergeStrategy {
        DeleteIndicator::builder()
            .delete_field("delete_indicator")
            .add_delete_values(["yes", "1"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_snapshot_without_digest_replaces_everything() {
        let mode: IngestMode = NontemporalSnapshot::builder().build().unwrap().into();
        let datasets = datasets(Vec::new(), Vec::new());
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        assert_eq!(
            render_ingest(&plans),
            vec![
                "DELETE FROM main as sink".to_string(),
                format!("INSERT INTO main ({COLUMNS}) (SELECT {VALUES} FROM staging as stage)"),
            ]
        );
    }

    #[test]
    fn test_snapshot_with_digest_partitions_and_auditing() {
        let mode: IngestMode = NontemporalSnapshot::builder()
            .digest_field("digest")
            .add_partition_field("biz_date")
            .auditing(audit())
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
                "DELETE FROM main as sink WHERE \
                 (NOT (EXISTS (SELECT * FROM staging as stage WHERE sink.\"digest\" = stage.\"digest\"))) \
                 AND (EXISTS (SELECT * FROM staging as stage WHERE sink.\"biz_date\" = stage.\"biz_date\"))"
                    .to_string(),
                format!(
                    "INSERT INTO main ({COLUMNS}, \"batch_update_time\") \
                     (SELECT {VALUES},'2000-01-01 00:00:00' FROM staging as stage \
                     WHERE NOT (EXISTS (SELECT * FROM main as sink WHERE sink.\"digest\" = stage.\"digest\")))"
                ),
            ]
        );
    }

    #[test]
    fn test_snapshot_empty_batch_deletes_all() {
        let mode: IngestMode = NontemporalSnapshot::builder()
            .add_partition_field("biz_date")
            .build()
            .unwrap()
            .into();
        let datasets = datasets(Vec::new(), Vec::new());
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan_empty_batch();
        assert_eq!(render_ingest(&plans), vec!["DELETE FROM main as sink"]);
    }

    #[test]
    fn test_delta_without_merge() {
        let mode: IngestMode = NontemporalDelta::builder()
            .digest_field("digest")
            .build()
            .unwrap()
            .into();
        let datasets = datasets(Vec::new(), Vec::new());
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        let matched = format!("({PK}) AND (sink.\"digest\" <> stage.\"digest\")");
        let set = ["id", "name", "amount", "biz_date", "digest"]
            .iter()
            .map(|f| {
                format!(
                    "sink.\"{f}\" = (SELECT stage.\"{f}\" FROM staging as stage WHERE {matched})"
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(
            render_ingest(&plans),
            vec![
                format!(
                    "UPDATE main as sink SET {set} WHERE EXISTS (SELECT * FROM staging as stage WHERE {matched})"
                ),
                format!(
                    "INSERT INTO main ({COLUMNS}) (SELECT {VALUES} FROM staging as stage \
                     WHERE NOT (EXISTS (SELECT * FROM main as sink WHERE ({PK}) AND (sink.\"digest\" = stage.\"digest\"))))"
                ),
            ]
        );
    }

    #[test]
    fn test_delta_merge_with_delete_indicator() {
        let mode: IngestMode = NontemporalDelta::builder()
            .digest_field("digest")
            .merge_strategy(delete_indicator())
            .build()
            .unwrap()
            .into();
        let datasets = datasets(
            Vec::new(),
            vec![Column::new("delete_indicator", DataType::Varchar)],
        );
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options)
            .with_merge(true)
            .plan();
        let set = ["id", "name", "amount", "biz_date", "digest"]
            .iter()
            .map(|f| format!("sink.\"{f}\" = stage.\"{f}\""))
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(
            render_for(SinkKind::Snowflake, &plans.ingest),
            vec![
                format!(
                    "MERGE INTO main as sink USING staging as stage ON {PK} \
                     WHEN MATCHED AND (sink.\"digest\" <> stage.\"digest\") AND (stage.\"delete_indicator\" NOT IN ('yes','1')) \
                     THEN UPDATE SET {set} \
                     WHEN NOT MATCHED AND stage.\"delete_indicator\" NOT IN ('yes','1') \
                     THEN INSERT ({COLUMNS}) VALUES ({VALUES})"
                ),
                format!(
                    "DELETE FROM main as sink WHERE EXISTS (SELECT * FROM staging as stage \
                     WHERE ({PK}) AND (sink.\"digest\" = stage.\"digest\") AND (stage.\"delete_indicator\" IN ('yes','1')))"
                ),
            ]
        );
    }

    #[test]
    fn test_delta_max_version_compares_versions() {
        let mode: IngestMode = NontemporalDelta::builder()
            .digest_field("digest")
            .deduplication(Deduplication::MaxVersion(
                MaxVersion::new("version").resolver(VersionResolver::GreaterThanEqualTo),
            ))
            .build()
            .unwrap()
            .into();
        let version = vec![Column::new("version", DataType::Integer)];
        let datasets = datasets(version.clone(), version);
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options)
            .with_merge(true)
            .plan();
        let sql = render_for(SinkKind::Snowflake, &plans.ingest);
        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains("WHEN MATCHED AND stage.\"version\" >= sink.\"version\" THEN"));
    }

    #[test]
    fn test_delta_versioned_insert_matches_on_key_only() {
        let mode: IngestMode = NontemporalDelta::builder()
            .digest_field("digest")
            .deduplication(Deduplication::MaxVersion(MaxVersion::new("version")))
            .build()
            .unwrap()
            .into();
        let version = vec![Column::new("version", DataType::Integer)];
        let datasets = datasets(version.clone(), version);
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        let sql = render(&plans.ingest);
        assert!(sql[0].contains(&format!(
            "WHERE EXISTS (SELECT * FROM staging as stage WHERE ({PK}) AND (stage.\"version\" > sink.\"version\"))"
        )));
        assert!(sql[1].ends_with(&format!(
            "WHERE NOT (EXISTS (SELECT * FROM main as sink WHERE {PK})))"
        )));
    }
}
