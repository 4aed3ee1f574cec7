//! Row count queries run around the ingest statements

use std::collections::BTreeMap;

use super::PlanContext;
use super::common::key_match;
use crate::logical_plan::{Condition, Selection, TableRef, Value};
use crate::models::{IngestMode, StatisticName};

type Statistics = BTreeMap<StatisticName, Selection>;

/// Counts that must be taken before main changes
pub(super) fn pre_ingest(ctx: &PlanContext) -> Statistics {
    let mut statistics = Statistics::new();
    match ctx.mode {
        IngestMode::NontemporalSnapshot(_) => {
            statistics.insert(
                StatisticName::RowsDeleted,
                count(ctx.main.clone(), None, StatisticName::RowsDeleted),
            );
        }
        IngestMode::NontemporalDelta(_) if ctx.delete_indicator().is_some() => {
            let marked = Selection::all_from(ctx.staging.clone()).filter(Condition::and_opt(vec![
                ctx.staging_conditions(),
                ctx.pk_match(),
                ctx.delete_marked(),
            ]));
            statistics.insert(
                StatisticName::RowsDeleted,
                count(
                    ctx.main.clone(),
                    Some(Condition::exists(marked)),
                    StatisticName::RowsDeleted,
                ),
            );
        }
        _ => {}
    }
    statistics
}

pub(super) fn post_ingest(ctx: &PlanContext) -> Statistics {
    let mut statistics = Statistics::new();
    statistics.insert(
        StatisticName::IncomingRecordCount,
        count(
            ctx.staging.clone(),
            ctx.staging_conditions(),
            StatisticName::IncomingRecordCount,
        ),
    );
    match ctx.mode {
        IngestMode::AppendOnly(_) | IngestMode::NontemporalSnapshot(_) => {
            let audited = ctx
                .audit()
                .map(|(field, value)| Condition::eq(ctx.main_field(field), value));
            statistics.insert(
                StatisticName::RowsInserted,
                count(ctx.main.clone(), audited, StatisticName::RowsInserted),
            );
            statistics.insert(StatisticName::RowsUpdated, zero(StatisticName::RowsUpdated));
            statistics.insert(
                StatisticName::RowsTerminated,
                zero(StatisticName::RowsTerminated),
            );
            if matches!(ctx.mode, IngestMode::AppendOnly(_)) {
                statistics.insert(StatisticName::RowsDeleted, zero(StatisticName::RowsDeleted));
            }
        }
        IngestMode::NontemporalDelta(_) => {
            statistics.insert(
                StatisticName::RowsTerminated,
                zero(StatisticName::RowsTerminated),
            );
            if ctx.delete_indicator().is_none() {
                statistics.insert(StatisticName::RowsDeleted, zero(StatisticName::RowsDeleted));
            }
        }
        IngestMode::UnitemporalSnapshot(_)
        | IngestMode::UnitemporalDelta(_)
        | IngestMode::BitemporalSnapshot(_)
        | IngestMode::BitemporalDelta(_) => milestoned(ctx, &mut statistics),
    }
    statistics
}

/// Counts read off the in/out columns of a milestoned main table
fn milestoned(ctx: &PlanContext, statistics: &mut Statistics) {
    let Some(milestoning) = ctx.transaction_milestoning() else {
        return;
    };
    let ((opened_field, opened), (closed_field, closed)) = match milestoning.batch_id_fields() {
        Some((i, o)) => ((i, ctx.batch_id()), (o, ctx.previous_batch_id())),
        None => match milestoning.date_time_fields() {
            Some((i, o)) => ((i, ctx.batch_start()), (o, ctx.batch_start())),
            None => return,
        },
    };
    let opened_here = Condition::eq(ctx.main_field(opened_field), opened.clone());
    let closed_here = Condition::eq(ctx.main_field(closed_field), closed);
    let opened_count = Value::subquery(count_all(ctx.main.clone(), Some(opened_here)));
    let closed_count = Value::subquery(count_all(ctx.main.clone(), Some(closed_here.clone())));

    statistics.insert(StatisticName::RowsDeleted, zero(StatisticName::RowsDeleted));
    if !ctx.mode.is_snapshot() && ctx.delete_indicator().is_none() {
        statistics.insert(
            StatisticName::RowsUpdated,
            count(
                ctx.main.clone(),
                Some(closed_here),
                StatisticName::RowsUpdated,
            ),
        );
        statistics.insert(
            StatisticName::RowsInserted,
            difference(opened_count, closed_count, StatisticName::RowsInserted),
        );
        statistics.insert(
            StatisticName::RowsTerminated,
            zero(StatisticName::RowsTerminated),
        );
        return;
    }

    // A closed row is an update when the same key was reopened in this batch
    let main_alias = ctx.main_alias();
    let reopened_alias = format!("{}2", main_alias);
    let milestoning_fields = milestoning.fields();
    let keys: Vec<&str> = ctx
        .datasets
        .main
        .primary_keys()
        .into_iter()
        .filter(|k| !milestoning_fields.contains(k))
        .collect();
    let reopened = Selection::all_from(ctx.main.clone().with_alias(reopened_alias.as_str()))
        .filter(Condition::and_opt(vec![
            key_match(&keys, &reopened_alias, main_alias),
            Some(Condition::eq(
                Value::field(&reopened_alias, opened_field),
                opened,
            )),
        ]));
    let updated = count_all(
        ctx.main.clone(),
        Condition::and_opt(vec![Some(closed_here), Some(Condition::exists(reopened))]),
    );
    let updated_count = Value::subquery(updated.clone());
    statistics.insert(
        StatisticName::RowsUpdated,
        Selection {
            values: vec![Value::count_all().alias(StatisticName::RowsUpdated.as_str())],
            ..updated
        },
    );
    statistics.insert(
        StatisticName::RowsInserted,
        difference(opened_count, updated_count.clone(), StatisticName::RowsInserted),
    );
    statistics.insert(
        StatisticName::RowsTerminated,
        difference(closed_count, updated_count, StatisticName::RowsTerminated),
    );
}

fn count_all(table: TableRef, condition: Option<Condition>) -> Selection {
    Selection::from(table, vec![Value::count_all()]).filter(condition)
}

/// `SELECT COUNT(*) as "<name>" FROM table [WHERE condition]`
fn count(table: TableRef, condition: Option<Condition>, name: StatisticName) -> Selection {
    Selection::from(table, vec![Value::count_all().alias(name.as_str())]).filter(condition)
}

fn zero(name: StatisticName) -> Selection {
    Selection::values(vec![Value::Integer(0).alias(name.as_str())])
}

fn difference(left: Value, right: Value, name: StatisticName) -> Selection {
    Selection::values(vec![left.minus(right).alias(name.as_str())])
}
