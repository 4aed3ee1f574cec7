//! Values appearing in select lists, assignments and predicates

use chrono::NaiveDateTime;

use super::conditions::Condition;
use super::selection::Selection;

/// Column reference, optionally qualified by a dataset alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub dataset: Option<String>,
    pub name: String,
}

impl FieldRef {
    pub fn new(dataset: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dataset: Some(dataset.into()),
            name: name.into(),
        }
    }

    /// Column reference without a dataset qualifier
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            dataset: None,
            name: name.into(),
        }
    }
}

/// Timestamp rendered as a sink literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampValue {
    Literal(NaiveDateTime),
    /// Text placed inside the literal as is, for executor placeholders and fixed bounds
    Pattern(String),
}

/// Functions a sink must be able to name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    Coalesce,
    Max,
    Min,
    Count,
    Upper,
    CurrentTimestamp,
    RowNumber,
}

impl FunctionName {
    /// Name used by ANSI SQL
    pub fn ansi_name(&self) -> &'static str {
        match self {
            FunctionName::Coalesce => "COALESCE",
            FunctionName::Max => "MAX",
            FunctionName::Min => "MIN",
            FunctionName::Count => "COUNT",
            FunctionName::Upper => "UPPER",
            FunctionName::CurrentTimestamp => "CURRENT_TIMESTAMP",
            FunctionName::RowNumber => "ROW_NUMBER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Plus,
    Minus,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Field(FieldRef),
    /// `*`
    All,
    String(String),
    Integer(i64),
    Timestamp(TimestampValue),
    /// Text emitted verbatim, used for executor placeholders such as `{BATCH_ID_PATTERN}`
    Raw(String),
    /// JSON document passed through the sink's JSON parse function
    Json(String),
    Function(FunctionName, Vec<Value>),
    /// `(SELECT ...)` used as a scalar
    Subquery(Box<Selection>),
    Arithmetic(Box<Value>, ArithmeticOp, Box<Value>),
    Case {
        when: Box<Condition>,
        then: Box<Value>,
        otherwise: Box<Value>,
    },
    /// `ROW_NUMBER() OVER (PARTITION BY ... ORDER BY ... DESC)`
    RowNumber {
        partition_by: Vec<Value>,
        order_by_desc: Vec<Value>,
    },
    Aliased(Box<Value>, String),
}

impl Value {
    pub fn field(dataset: &str, name: &str) -> Value {
        Value::Field(FieldRef::new(dataset, name))
    }

    pub fn bare_field(name: &str) -> Value {
        Value::Field(FieldRef::bare(name))
    }

    pub fn string(value: impl Into<String>) -> Value {
        Value::String(value.into())
    }

    pub fn function(name: FunctionName, args: Vec<Value>) -> Value {
        Value::Function(name, args)
    }

    pub fn count_all() -> Value {
        Value::Function(FunctionName::Count, vec![Value::All])
    }

    pub fn subquery(selection: Selection) -> Value {
        Value::Subquery(Box::new(selection))
    }

    pub fn minus(self, other: Value) -> Value {
        Value::Arithmetic(Box::new(self), ArithmeticOp::Minus, Box::new(other))
    }

    pub fn plus(self, other: Value) -> Value {
        Value::Arithmetic(Box::new(self), ArithmeticOp::Plus, Box::new(other))
    }

    pub fn alias(self, alias: impl Into<String>) -> Value {
        Value::Aliased(Box::new(self), alias.into())
    }

    /// Referenced column name, looking through an alias
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Value::Field(f) => Some(&f.name),
            Value::Aliased(inner, _) => inner.field_name(),
            _ => None,
        }
    }
}
