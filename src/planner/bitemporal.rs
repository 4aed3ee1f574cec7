//! Bitemporal ingestion where staging carries both ends of the validity window
//!
//! Planned like the unitemporal modes. Staging keys are matched against the
//! target validity columns and new versions copy the source window over.

use super::PlanContext;
use super::common::infinite_timestamp;
use super::unitemporal::{self, Partitions, Versioning};
use crate::logical_plan::{Condition, Operation};
use crate::models::{BitemporalDelta, BitemporalSnapshot, ValidityMilestoning};

pub(super) fn snapshot(ctx: &PlanContext, mode: &BitemporalSnapshot) -> Vec<Operation> {
    let partitions = Partitions {
        fields: &mode.partition_fields,
        values_by_field: None,
    };
    unitemporal::snapshot_with(ctx, &versioning(ctx, &mode.validity_milestoning), partitions)
}

pub(super) fn snapshot_empty_batch(ctx: &PlanContext, mode: &BitemporalSnapshot) -> Vec<Operation> {
    let partitions = Partitions {
        fields: &mode.partition_fields,
        values_by_field: None,
    };
    unitemporal::close_all(ctx, partitions)
}

pub(super) fn delta(ctx: &PlanContext, mode: &BitemporalDelta) -> Vec<Operation> {
    unitemporal::delta_with(ctx, &versioning(ctx, &mode.validity_milestoning))
}

fn versioning<'a>(ctx: &PlanContext<'a>, validity: &'a ValidityMilestoning) -> Versioning<'a> {
    let main = &ctx.datasets.main;
    let derivation = &validity.derivation;
    let target = |key: &'a str| -> &'a str {
        if main.has_column(key) {
            key
        } else if key == derivation.source_from() {
            &validity.date_time_from
        } else if Some(key) == derivation.source_thru() {
            &validity.date_time_thru
        } else {
            key
        }
    };
    let pk_match = Condition::and(
        ctx.primary_keys()
            .into_iter()
            .map(|key| Condition::eq(ctx.main_field(target(key)), ctx.stage_field(key)))
            .collect(),
    );

    let data_fields = ctx.data_fields();
    let thru = derivation
        .source_thru()
        .map(|field| ctx.stage_field(field))
        .unwrap_or_else(infinite_timestamp);
    let mut open_values = ctx.open_values();
    for (column, value) in [
        (
            validity.date_time_from.as_str(),
            ctx.stage_field(derivation.source_from()),
        ),
        (validity.date_time_thru.as_str(), thru),
    ] {
        if !data_fields.contains(&column) {
            open_values.push((column, value));
        }
    }
    Versioning {
        pk_match,
        open_values,
    }
}

#[cfg(test)]
mod tests {
    use super::super::Planner;
    use super::super::fixtures::{BATCH_ID, bitemporal_datasets, options, render_ingest};
    use crate::models::{
        BitemporalDelta, BitemporalSnapshot, Column, DataType, IngestMode,
        TransactionMilestoning, ValidityDerivation, ValidityMilestoning,
    };

    const COLUMNS: &str = "\"id\", \"name\", \"amount\", \"digest\", \"batch_id_in\", \"batch_id_out\", \
                           \"validity_from_target\", \"validity_through_target\"";
    const PK: &str = "(sink.\"id\" = stage.\"id\") AND (sink.\"name\" = stage.\"name\") \
                      AND (sink.\"validity_from_target\" = stage.\"validity_from_reference\")";

    fn validity() -> ValidityMilestoning {
        ValidityMilestoning::builder()
            .date_time_from("validity_from_target")
            .date_time_thru("validity_through_target")
            .derivation(ValidityDerivation::SourceSpecifiesFromAndThru {
                source_from: "validity_from_reference".to_string(),
                source_thru: "validity_through_reference".to_string(),
            })
            .build()
            .unwrap()
    }

    fn staging_columns() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Integer).primary_key(),
            Column::new("name", DataType::Varchar).primary_key(),
            Column::new("amount", DataType::Double),
            Column::new("validity_from_reference", DataType::Datetime).primary_key(),
            Column::new("validity_through_reference", DataType::Datetime),
            Column::new("digest", DataType::Varchar),
        ]
    }

    fn values() -> String {
        format!(
            "stage.\"id\",stage.\"name\",stage.\"amount\",stage.\"digest\",{BATCH_ID},999999999,\
             stage.\"validity_from_reference\",stage.\"validity_through_reference\""
        )
    }

    #[test]
    fn test_snapshot_maps_source_validity_onto_target() {
        let mode: IngestMode = BitemporalSnapshot::builder()
            .digest_field("digest")
            .transaction_milestoning(TransactionMilestoning::batch_id(
                "batch_id_in",
                "batch_id_out",
            ))
            .validity_milestoning(validity())
            .build()
            .unwrap()
            .into();
        let datasets = bitemporal_datasets(staging_columns());
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        assert_eq!(
            render_ingest(&plans),
            vec![
                format!(
                    "UPDATE main as sink SET sink.\"batch_id_out\" = {BATCH_ID}-1 \
                     WHERE (sink.\"batch_id_out\" = 999999999) AND \
                     (NOT (EXISTS (SELECT * FROM staging as stage WHERE ({PK}) AND (sink.\"digest\" = stage.\"digest\"))))"
                ),
                format!(
                    "INSERT INTO main ({COLUMNS}) (SELECT {} FROM staging as stage \
                     WHERE NOT (stage.\"digest\" IN (SELECT sink.\"digest\" FROM main as sink WHERE sink.\"batch_id_out\" = 999999999)))",
                    values()
                ),
            ]
        );
    }

    #[test]
    fn test_snapshot_empty_batch() {
        let mode: IngestMode = BitemporalSnapshot::builder()
            .digest_field("digest")
            .transaction_milestoning(TransactionMilestoning::batch_id(
                "batch_id_in",
                "batch_id_out",
            ))
            .validity_milestoning(validity())
            .build()
            .unwrap()
            .into();
        let datasets = bitemporal_datasets(staging_columns());
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan_empty_batch();
        assert_eq!(
            render_ingest(&plans),
            vec![format!(
                "UPDATE main as sink SET sink.\"batch_id_out\" = {BATCH_ID}-1 WHERE sink.\"batch_id_out\" = 999999999"
            )]
        );
    }

    #[test]
    fn test_delta_from_and_thru() {
        let mode: IngestMode = BitemporalDelta::builder()
            .digest_field("digest")
            .transaction_milestoning(TransactionMilestoning::batch_id(
                "batch_id_in",
                "batch_id_out",
            ))
            .validity_milestoning(validity())
            .build()
            .unwrap()
            .into();
        let datasets = bitemporal_datasets(staging_columns());
        let options = options();
        let plans = Planner::new(&mode, &datasets, &options).plan();
        assert_eq!(
            render_ingest(&plans),
            vec![
                format!(
                    "UPDATE main as sink SET sink.\"batch_id_out\" = {BATCH_ID}-1 \
                     WHERE (sink.\"batch_id_out\" = 999999999) AND \
                     (EXISTS (SELECT * FROM staging as stage WHERE ({PK}) AND (sink.\"digest\" <> stage.\"digest\")))"
                ),
                format!(
                    "INSERT INTO main ({COLUMNS}) (SELECT {} FROM staging as stage \
                     WHERE NOT (EXISTS (SELECT * FROM main as sink WHERE (sink.\"batch_id_out\" = 999999999) \
                     AND (sink.\"digest\" = stage.\"digest\") AND ({PK}))))",
                    values()
                ),
            ]
        );
    }
}
