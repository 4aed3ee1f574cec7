//! Dialect-neutral logical plan
//!
//! A [`LogicalPlan`] is an ordered list of [`Operation`]s produced by the
//! planner and turned into SQL text by [`crate::render`]. Nothing in this
//! module knows about quoting, case conversion or function names.

pub mod conditions;
pub mod selection;
pub mod values;

pub use conditions::{Comparator, Condition, InList};
pub use selection::{Join, JoinKind, Selection, Source, TableRef};
pub use values::{ArithmeticOp, FieldRef, FunctionName, TimestampValue, Value};

use crate::models::Column;

/// Kind of column change performed by an ALTER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterKind {
    AddColumn,
    ChangeDatatype,
    NullableColumn,
}

impl AlterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlterKind::AddColumn => "ADD_COLUMN",
            AlterKind::ChangeDatatype => "CHANGE_DATATYPE",
            AlterKind::NullableColumn => "NULLABLE_COLUMN",
        }
    }
}

/// `MERGE INTO target USING source ON ... WHEN MATCHED ... WHEN NOT MATCHED ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub target: TableRef,
    pub source: Source,
    pub on: Condition,
    pub matched_condition: Option<Condition>,
    pub assignments: Vec<(FieldRef, Value)>,
    pub not_matched_condition: Option<Condition>,
    pub insert_columns: Vec<String>,
    pub insert_values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create {
        table: TableRef,
        columns: Vec<Column>,
        if_not_exists: bool,
    },
    Drop {
        table: TableRef,
        if_exists: bool,
    },
    Delete {
        table: TableRef,
        condition: Option<Condition>,
    },
    Update {
        table: TableRef,
        assignments: Vec<(FieldRef, Value)>,
        condition: Option<Condition>,
    },
    Insert {
        table: TableRef,
        columns: Vec<String>,
        source: Selection,
    },
    Merge(Box<Merge>),
    Alter {
        table: TableRef,
        kind: AlterKind,
        column: Column,
    },
    Select(Selection),
}

impl Operation {
    /// Short name used in logs and unsupported-operation errors
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "CREATE",
            Operation::Drop { .. } => "DROP",
            Operation::Delete { .. } => "DELETE",
            Operation::Update { .. } => "UPDATE",
            Operation::Insert { .. } => "INSERT",
            Operation::Merge(_) => "MERGE",
            Operation::Alter { .. } => "ALTER",
            Operation::Select(_) => "SELECT",
        }
    }
}

/// Ordered operations to run as one unit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogicalPlan {
    pub operations: Vec<Operation>,
}

impl LogicalPlan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
