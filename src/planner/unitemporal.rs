//! Unitemporal snapshot and delta ingestion
//!
//! Rows in main are never updated in place. A change closes the open
//! version (sets its out-columns) and inserts a new open version. The
//! bitemporal "from and thru" flow reuses these plans through [`Versioning`].

use std::collections::BTreeMap;

use super::PlanContext;
use super::common::key_match;
use crate::logical_plan::{Condition, Operation, Selection, Value};
use crate::models::{UnitemporalDelta, UnitemporalSnapshot};

/// How staged rows find their version in main and what a new version holds
#[derive(Debug, Clone)]
pub(super) struct Versioning<'a> {
    pub pk_match: Option<Condition>,
    pub open_values: Vec<(&'a str, Value)>,
}

impl<'a> Versioning<'a> {
    pub fn unitemporal(ctx: &PlanContext<'a>) -> Self {
        Self {
            pk_match: ctx.pk_match(),
            open_values: ctx.open_values(),
        }
    }
}

/// Partitioning of a snapshot
#[derive(Debug, Clone, Copy)]
pub(super) struct Partitions<'m> {
    pub fields: &'m [String],
    pub values_by_field: Option<&'m BTreeMap<String, Vec<String>>>,
}

impl Partitions<'_> {
    fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }

    /// `sink.p IN (...)` per field with listed values
    fn value_conditions(&self, ctx: &PlanContext) -> Vec<Condition> {
        self.values_by_field
            .into_iter()
            .flatten()
            .map(|(field, values)| {
                Condition::in_values(
                    ctx.main_field(field),
                    values.iter().map(|v| Value::string(v.as_str())).collect(),
                )
            })
            .collect()
    }

    fn has_values(&self) -> bool {
        self.values_by_field.is_some_and(|values| !values.is_empty())
    }
}

pub(super) fn snapshot(ctx: &PlanContext, mode: &UnitemporalSnapshot) -> Vec<Operation> {
    let partitions = Partitions {
        fields: &mode.partition_fields,
        values_by_field: Some(&mode.partition_values_by_field),
    };
    snapshot_with(ctx, &Versioning::unitemporal(ctx), partitions)
}

pub(super) fn snapshot_empty_batch(ctx: &PlanContext, mode: &UnitemporalSnapshot) -> Vec<Operation> {
    let partitions = Partitions {
        fields: &mode.partition_fields,
        values_by_field: Some(&mode.partition_values_by_field),
    };
    close_all(ctx, partitions)
}

pub(super) fn delta(ctx: &PlanContext, _mode: &UnitemporalDelta) -> Vec<Operation> {
    delta_with(ctx, &Versioning::unitemporal(ctx))
}

/// Close open versions missing from the snapshot, then open the new ones
pub(super) fn snapshot_with(
    ctx: &PlanContext,
    versioning: &Versioning,
    partitions: Partitions,
) -> Vec<Operation> {
    let staging_rows = |condition: Option<Condition>| {
        Selection::all_from(ctx.staging.clone())
            .filter(Condition::and_opt(vec![ctx.staging_conditions(), condition]))
    };
    let partition_match = key_match(
        &partitions.field_names(),
        ctx.main_alias(),
        ctx.stage_alias(),
    );

    let mut closing = vec![
        ctx.open_row(ctx.main_alias()),
        Some(Condition::not_exists(staging_rows(Condition::and_opt(vec![
            versioning.pk_match.clone(),
            ctx.digest_matches(),
        ])))),
    ];
    if partitions.has_values() {
        closing.extend(partitions.value_conditions(ctx).into_iter().map(Some));
    } else if let Some(partition_match) = partition_match.clone() {
        closing.push(Some(Condition::exists(staging_rows(Some(partition_match)))));
    }
    let update = Operation::Update {
        table: ctx.main.clone(),
        assignments: ctx.close_assignments(),
        condition: Condition::and_opt(closing),
    };

    let new_digest = ctx.mode.digest_field().map(|digest| {
        let open_digests = Selection::from(ctx.main.clone(), vec![ctx.main_field(digest)]).filter(
            Condition::and_opt(vec![ctx.open_row(ctx.main_alias()), partition_match]),
        );
        Condition::not(Condition::in_selection(ctx.stage_field(digest), open_digests))
    });
    let insert = ctx.insert_into_main(
        ctx.staging_source(false),
        versioning.open_values.clone(),
        vec![new_digest],
    );
    vec![update, insert]
}

/// Close every open version, within the listed partition values if any
pub(super) fn close_all(ctx: &PlanContext, partitions: Partitions) -> Vec<Operation> {
    let mut conditions = vec![ctx.open_row(ctx.main_alias())];
    conditions.extend(partitions.value_conditions(ctx).into_iter().map(Some));
    vec![Operation::Update {
        table: ctx.main.clone(),
        assignments: ctx.close_assignments(),
        condition: Condition::and_opt(conditions),
    }]
}

/// Close open versions replaced or deleted by staging, then open new versions
pub(super) fn delta_with(ctx: &PlanContext, versioning: &Versioning) -> Vec<Operation> {
    let staging = ctx.staging_source(false);
    let replaced = match (ctx.changed(), ctx.delete_marked()) {
        (Some(changed), Some(deleted)) => Condition::or(vec![changed, deleted]),
        (changed, deleted) => changed.or(deleted),
    };

    let mut closing = vec![ctx.open_row(ctx.main_alias())];
    closing.extend(ctx.optimization_conditions().into_iter().map(Some));
    closing.push(Some(Condition::exists(
        Selection::all_from(staging.source.clone()).filter(Condition::and_opt(vec![
            staging.condition.clone(),
            versioning.pk_match.clone(),
            replaced,
        ])),
    )));
    let update = Operation::Update {
        table: ctx.main.clone(),
        assignments: ctx.close_assignments(),
        condition: Condition::and_opt(closing),
    };

    let mut current = vec![
        ctx.open_row(ctx.main_alias()),
        ctx.unchanged(),
        versioning.pk_match.clone(),
    ];
    current.extend(ctx.optimization_conditions().into_iter().map(Some));
    let already_open =
        Condition::not_exists(Selection::all_from(ctx.main.clone()).filter(Condition::and_opt(current)));
    let insert = ctx.insert_into_main(
        staging,
        versioning.open_values.clone(),
        vec![Some(already_open), ctx.delete_not_marked()],
    );
    vec![update, insert]
}
