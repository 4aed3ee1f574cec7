//! Bitemporal delta where staging carries only the start of validity
//!
//! The end of each validity window is derived from the next start date for
//! the same key, looking at both staging and the open rows of main. New
//! and split versions are staged in a temp table, the rows they replace are
//! closed, and the temp rows are copied into main. Deletes go through a
//! second temp table where surviving neighbours are stitched back together.

use super::PlanContext;
use super::common::{infinite_timestamp, key_match};
use crate::logical_plan::{
    Comparator, Condition, FunctionName, JoinKind, Operation, Selection, Source, TableRef, Value,
};
use crate::models::{BitemporalDelta, Column, DataType};

const X: &str = "x";
const Y: &str = "y";
const START: &str = "start_date";
const END: &str = "end_date";

/// Column roles of the temp tables
struct Layout<'a> {
    /// Staging keys without the validity start
    keys: Vec<&'a str>,
    data: Vec<&'a str>,
    digest: &'a str,
    source_from: &'a str,
    from: &'a str,
    thru: &'a str,
    milestoning: Vec<&'a str>,
    /// Staged rows taking part in the batch
    staged: Option<Condition>,
}

impl<'a> Layout<'a> {
    fn new(ctx: &PlanContext<'a>, mode: &'a BitemporalDelta) -> Self {
        let validity = &mode.validity_milestoning;
        let source_from = validity.derivation.source_from();
        let keys: Vec<&str> = ctx
            .primary_keys()
            .into_iter()
            .filter(|k| *k != source_from)
            .collect();
        let delete_field = ctx.delete_indicator().map(|d| d.delete_field.as_str());
        let split_field = ctx.mode.data_split_field();
        let digest = mode.digest_field.as_str();
        let data = ctx
            .datasets
            .staging
            .column_names()
            .into_iter()
            .filter(|name| {
                *name != digest
                    && *name != source_from
                    && !keys.contains(name)
                    && Some(*name) != delete_field
                    && Some(*name) != split_field
            })
            .collect();
        let mut staged = ctx.filter_conditions();
        staged.extend(ctx.delete_not_marked());
        staged.extend(ctx.split_condition());
        Self {
            keys,
            data,
            digest,
            source_from,
            from: &validity.date_time_from,
            thru: &validity.date_time_thru,
            milestoning: mode.transaction_milestoning.fields(),
            staged: Condition::and(staged),
        }
    }

    /// Keys, data and digest: the columns carried through unchanged
    fn carried(&self) -> Vec<&'a str> {
        let mut columns = self.keys.clone();
        columns.extend(&self.data);
        columns.push(self.digest);
        columns
    }

    fn temp_columns(&self) -> Vec<String> {
        let mut columns = self.carried();
        columns.push(self.from);
        columns.push(self.thru);
        columns.extend(&self.milestoning);
        columns.into_iter().map(str::to_string).collect()
    }
}

pub(super) fn create_temp_tables(ctx: &PlanContext, mode: &BitemporalDelta) -> Vec<Operation> {
    let columns = ctx.datasets.main.columns.clone();
    let mut operations = vec![Operation::Create {
        table: ctx.temp_table().unaliased(),
        columns: columns.clone(),
        if_not_exists: true,
    }];
    if let Some(indicator) = mode.merge_strategy.delete_indicator() {
        let mut columns = columns;
        columns.push(Column::new(indicator.delete_field.as_str(), DataType::Boolean));
        operations.push(Operation::Create {
            table: ctx.temp_with_delete_indicator_table().unaliased(),
            columns,
            if_not_exists: true,
        });
    }
    operations
}

pub(super) fn ingest(ctx: &PlanContext, mode: &BitemporalDelta) -> Vec<Operation> {
    let layout = Layout::new(ctx, mode);
    let temp = ctx.temp_table();
    let mut operations = vec![
        stage_to_temp(ctx, &layout),
        main_to_temp(ctx, &layout),
        close_replaced(ctx, &layout, &temp),
        temp_to_main(ctx, &temp),
    ];
    let temp_with_deletes = ctx.temp_with_delete_indicator_table();
    if let Some(indicator) = mode.merge_strategy.delete_indicator() {
        let delete_field = indicator.delete_field.as_str();
        operations.push(main_to_temp_with_deletes(ctx, &layout, delete_field));
        operations.push(close_replaced(ctx, &layout, &temp_with_deletes));
        operations.push(stitch_survivors(&layout, &temp_with_deletes, delete_field, ctx));
    }
    operations.push(Operation::Delete {
        table: temp,
        condition: None,
    });
    if ctx.delete_indicator().is_some() {
        operations.push(Operation::Delete {
            table: temp_with_deletes,
            condition: None,
        });
    }
    operations
}

fn fields(alias: &str, names: &[&str]) -> Vec<Value> {
    names.iter().map(|n| Value::field(alias, n)).collect()
}

fn min(value: Value) -> Value {
    Value::function(FunctionName::Min, vec![value])
}

fn coalesce(first: Value, second: Value) -> Value {
    Value::function(FunctionName::Coalesce, vec![first, second])
}

fn compare(left: Value, comparator: Comparator, right: Value) -> Option<Condition> {
    Some(Condition::compare(left, comparator, right))
}

/// `SELECT "keys","start" as "start_date"` from a table
fn starts(layout: &Layout, table: TableRef, start: &str, filter: Option<Condition>) -> Selection {
    let mut values: Vec<Value> = layout.keys.iter().map(|k| Value::bare_field(k)).collect();
    values.push(Value::bare_field(start).alias(START));
    Selection::from(table, values).filter(filter)
}

/// `x.keys, x."start_date"`
fn keys_and_start(layout: &Layout) -> Vec<Value> {
    let mut values = fields(X, &layout.keys);
    values.push(Value::field(X, START));
    values
}

/// Windows overlapping on key with the next start strictly inside `x`
fn next_start_inside(layout: &Layout) -> Option<Condition> {
    Condition::and_opt(vec![
        key_match(&layout.keys, X, Y),
        compare(Value::field(Y, START), Comparator::Gt, Value::field(X, START)),
        compare(Value::field(Y, START), Comparator::Lt, Value::field(X, END)),
    ])
}

fn insert(table: TableRef, columns: Vec<String>, source: Selection) -> Operation {
    Operation::Insert {
        table: table.unaliased(),
        columns,
        source,
    }
}

fn open_values(ctx: &PlanContext) -> Vec<Value> {
    ctx.open_values().into_iter().map(|(_, v)| v).collect()
}

/// New staged versions, each ending where the next one starts
fn stage_to_temp(ctx: &PlanContext, layout: &Layout) -> Operation {
    let staged_starts = || {
        starts(
            layout,
            ctx.staging.clone(),
            layout.source_from,
            layout.staged.clone(),
        )
    };
    let open_starts = starts(
        layout,
        ctx.main.clone(),
        layout.from,
        ctx.open_row(ctx.main_alias()),
    )
    .alias(Y);

    let mut first_end = keys_and_start(layout);
    first_end.push(
        coalesce(min(Value::field(Y, START)), infinite_timestamp()).alias(END),
    );
    let first = Selection::from(
        Source::join(
            staged_starts().alias(X).into(),
            JoinKind::LeftOuter,
            open_starts.into(),
            on(Condition::and_opt(vec![
                key_match(&layout.keys, X, Y),
                compare(Value::field(X, START), Comparator::Lt, Value::field(Y, START)),
            ])),
        ),
        first_end,
    )
    .group_by(keys_and_start(layout))
    .alias(X);

    let mut end = keys_and_start(layout);
    end.push(coalesce(min(Value::field(Y, START)), min(Value::field(X, END))).alias(END));
    let ends = Selection::from(
        Source::join(
            first.into(),
            JoinKind::LeftOuter,
            staged_starts().alias(Y).into(),
            on(next_start_inside(layout)),
        ),
        end,
    )
    .group_by(keys_and_start(layout))
    .alias(Y);

    let staged_rows = Selection::from(
        ctx.staging.clone(),
        fields(ctx.stage_alias(), &ctx.datasets.staging.column_names()),
    )
    .filter(layout.staged.clone())
    .alias(X);

    let mut values = fields(X, &layout.carried());
    values.push(Value::field(X, layout.source_from).alias(START));
    values.push(Value::field(Y, END));
    values.extend(open_values(ctx));
    let source = Source::join(
        staged_rows.into(),
        JoinKind::LeftOuter,
        ends.into(),
        on(Condition::and_opt(vec![
            key_match(&layout.keys, X, Y),
            Some(Condition::eq(
                Value::field(X, layout.source_from),
                Value::field(Y, START),
            )),
        ])),
    );
    insert(ctx.temp_table(), layout.temp_columns(), Selection::from(source, values))
}

/// Open main versions cut short by a staged start inside their window
fn main_to_temp(ctx: &PlanContext, layout: &Layout) -> Operation {
    let open = ctx.open_row(ctx.main_alias());
    let open_rows = Selection::from(
        ctx.main.clone(),
        fields(ctx.main_alias(), &ctx.datasets.main.column_names()),
    )
    .filter(open.clone())
    .alias(X);

    let mut windows = layout.keys.iter().map(|k| Value::bare_field(k)).collect::<Vec<_>>();
    windows.push(Value::bare_field(layout.from).alias(START));
    windows.push(Value::bare_field(layout.thru).alias(END));
    let open_windows = Selection::from(ctx.main.clone(), windows)
        .filter(open)
        .alias(X);
    let staged_starts = starts(
        layout,
        ctx.staging.clone(),
        layout.source_from,
        layout.staged.clone(),
    );

    let mut cut = keys_and_start(layout);
    cut.push(min(Value::field(Y, START)).alias(END));
    let cuts = Selection::from(
        Source::join(
            open_windows.into(),
            JoinKind::Inner,
            staged_starts.clone().alias(Y).into(),
            on(next_start_inside(layout)),
        ),
        cut,
    )
    .group_by(keys_and_start(layout))
    .alias(X);

    let restated = Condition::and_opt(vec![
        Condition::and_opt(vec![
            key_match(&layout.keys, X, ctx.stage_alias()),
            Some(Condition::eq(
                Value::field(X, START),
                ctx.stage_field(layout.source_from),
            )),
        ]),
        layout.staged.clone(),
    ]);
    let mut kept = keys_and_start(layout);
    kept.push(Value::field(X, END).alias(END));
    let remainders = Selection::from(cuts, kept)
        .filter(Some(Condition::not_exists(
            starts(layout, ctx.staging.clone(), layout.source_from, restated),
        )))
        .alias(Y);

    let mut values = fields(X, &layout.carried());
    values.push(Value::field(X, layout.from).alias(START));
    values.push(Value::field(Y, END));
    values.extend(open_values(ctx));
    let source = Source::join(
        open_rows.into(),
        JoinKind::Inner,
        remainders.into(),
        on(Condition::and_opt(vec![
            key_match(&layout.keys, X, Y),
            Some(Condition::eq(Value::field(X, layout.from), Value::field(Y, START))),
        ])),
    );
    insert(ctx.temp_table(), layout.temp_columns(), Selection::from(source, values))
}

/// Close open main rows restated by a temp table
fn close_replaced(ctx: &PlanContext, layout: &Layout, temp: &TableRef) -> Operation {
    let alias = temp.qualifier();
    let restated = Condition::and_opt(vec![
        key_match(&layout.keys, ctx.main_alias(), alias),
        Some(Condition::eq(
            ctx.main_field(layout.from),
            Value::field(alias, layout.from),
        )),
    ]);
    Operation::Update {
        table: ctx.main.clone(),
        assignments: ctx.close_assignments(),
        condition: Condition::and_opt(vec![
            Some(Condition::exists(
                Selection::all_from(temp.clone()).filter(restated),
            )),
            ctx.open_row(ctx.main_alias()),
        ]),
    }
}

fn temp_to_main(ctx: &PlanContext, temp: &TableRef) -> Operation {
    let columns = ctx.datasets.main.column_names();
    let values = fields(temp.qualifier(), &columns);
    insert(
        ctx.main.clone(),
        columns.into_iter().map(str::to_string).collect(),
        Selection::from(temp.clone(), values),
    )
}

/// Open main versions next to a delete, flagged 1 when the delete hits them
fn main_to_temp_with_deletes(ctx: &PlanContext, layout: &Layout, delete_field: &str) -> Operation {
    let source_from = ctx.stage_field(layout.source_from);
    let touched = Condition::and_opt(vec![
        key_match(&layout.keys, ctx.main_alias(), ctx.stage_alias()),
        Condition::or(vec![
            Condition::eq(ctx.main_field(layout.from), source_from.clone()),
            Condition::eq(ctx.main_field(layout.thru), source_from),
        ]),
        ctx.delete_marked(),
        ctx.staging_conditions(),
    ]);
    let neighbours = Selection::all_from(ctx.main.clone())
        .filter(Condition::and_opt(vec![
            ctx.open_row(ctx.main_alias()),
            Some(Condition::exists(
                Selection::all_from(ctx.staging.clone()).filter(touched),
            )),
        ]))
        .alias(X);
    let deletes = Selection::all_from(ctx.staging.clone())
        .filter(ctx.staging_conditions())
        .alias(Y);

    let mut values = fields(X, &layout.carried());
    values.push(Value::field(X, layout.from).alias(START));
    values.push(Value::field(X, layout.thru).alias(END));
    values.extend(open_values(ctx));
    values.push(Value::Case {
        when: Box::new(Condition::IsNull(Value::field(Y, delete_field))),
        then: Box::new(Value::Integer(0)),
        otherwise: Box::new(Value::Integer(1)),
    });
    let source = Source::join(
        neighbours.into(),
        JoinKind::LeftOuter,
        deletes.into(),
        on(Condition::and_opt(vec![
            key_match(&layout.keys, X, Y),
            Some(Condition::eq(
                Value::field(X, layout.from),
                Value::field(Y, layout.source_from),
            )),
        ])),
    );
    let mut columns = layout.temp_columns();
    columns.push(delete_field.to_string());
    insert(
        ctx.temp_with_delete_indicator_table(),
        columns,
        Selection::from(source, values),
    )
}

/// Re-open surviving versions, each stretched over the deleted windows after it
fn stitch_survivors(
    layout: &Layout,
    temp: &TableRef,
    delete_field: &str,
    ctx: &PlanContext,
) -> Operation {
    let x = temp.clone().with_alias(X);
    let y = temp.clone().with_alias(Y);
    let carried = layout.carried();

    let mut next_values = fields(X, &carried);
    next_values.push(Value::field(X, layout.from).alias(START));
    next_values.push(coalesce(min(Value::field(Y, layout.from)), infinite_timestamp()).alias(END));
    next_values.extend(fields(X, &layout.milestoning));
    let mut next_group = fields(X, &carried);
    next_group.push(Value::field(X, layout.from));
    next_group.extend(fields(X, &layout.milestoning));
    let next_survivor = Selection::from(
        Source::join(
            x.into(),
            JoinKind::LeftOuter,
            y.clone().into(),
            on(Condition::and_opt(vec![
                key_match(&layout.keys, X, Y),
                compare(
                    Value::field(Y, layout.from),
                    Comparator::Gt,
                    Value::field(X, layout.from),
                ),
                Some(Condition::eq(Value::field(Y, delete_field), Value::Integer(0))),
            ])),
        ),
        next_values,
    )
    .filter(Some(Condition::eq(Value::field(X, delete_field), Value::Integer(0))))
    .group_by(next_group)
    .alias(X);

    let mut values = fields(X, &carried);
    values.push(Value::field(X, START).alias(START));
    values.push(Value::function(FunctionName::Max, vec![Value::field(Y, layout.thru)]).alias(END));
    values.extend(fields(X, &layout.milestoning));
    let mut group = fields(X, &carried);
    group.push(Value::field(X, START));
    group.extend(fields(X, &layout.milestoning));
    let source = Source::join(
        next_survivor.into(),
        JoinKind::LeftOuter,
        y.into(),
        on(Condition::and_opt(vec![
            key_match(&layout.keys, X, Y),
            compare(Value::field(Y, layout.thru), Comparator::Gt, Value::field(X, START)),
            compare(Value::field(Y, layout.thru), Comparator::Lte, Value::field(X, END)),
            Some(Condition::ne(Value::field(Y, delete_field), Value::Integer(0))),
        ])),
    );
    insert(
        ctx.main.clone(),
        layout.temp_columns(),
        Selection::from(source, values).group_by(group),
    )
}

/// Join condition; a keyless join still needs an ON clause
fn on(condition: Option<Condition>) -> Condition {
    condition.unwrap_or_else(|| Condition::eq(Value::Integer(1), Value::Integer(1)))
}
