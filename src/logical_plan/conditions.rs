//! Boolean predicates

use super::selection::Selection;
use super::values::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "<>",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
        }
    }
}

/// Right-hand side of `IN`
#[derive(Debug, Clone, PartialEq)]
pub enum InList {
    Values(Vec<Value>),
    Selection(Box<Selection>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Exists(Box<Selection>),
    Compare(Value, Comparator, Value),
    In(Value, InList),
    NotIn(Value, InList),
    IsNull(Value),
}

impl Condition {
    pub fn compare(left: Value, comparator: Comparator, right: Value) -> Condition {
        Condition::Compare(left, comparator, right)
    }

    pub fn eq(left: Value, right: Value) -> Condition {
        Condition::Compare(left, Comparator::Eq, right)
    }

    pub fn ne(left: Value, right: Value) -> Condition {
        Condition::Compare(left, Comparator::Ne, right)
    }

    /// Conjunction of `parts`; a single part is returned unwrapped
    ///
    /// Returns `None` when `parts` is empty.
    pub fn and(parts: Vec<Condition>) -> Option<Condition> {
        Self::combine(parts, Condition::And)
    }

    /// Disjunction of `parts`; a single part is returned unwrapped
    pub fn or(parts: Vec<Condition>) -> Option<Condition> {
        Self::combine(parts, Condition::Or)
    }

    /// Conjunction of the parts that are present
    pub fn and_opt(parts: Vec<Option<Condition>>) -> Option<Condition> {
        Self::and(parts.into_iter().flatten().collect())
    }

    fn combine(
        mut parts: Vec<Condition>,
        wrap: fn(Vec<Condition>) -> Condition,
    ) -> Option<Condition> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(wrap(parts)),
        }
    }

    pub fn not(condition: Condition) -> Condition {
        Condition::Not(Box::new(condition))
    }

    pub fn exists(selection: Selection) -> Condition {
        Condition::Exists(Box::new(selection))
    }

    pub fn not_exists(selection: Selection) -> Condition {
        Condition::not(Condition::exists(selection))
    }

    /// `value IN (...)`, or `value = x` for a single element
    pub fn in_values(value: Value, mut values: Vec<Value>) -> Condition {
        if values.len() == 1
            && let Some(single) = values.pop()
        {
            return Condition::eq(value, single);
        }
        Condition::In(value, InList::Values(values))
    }

    /// `value NOT IN (...)`, or `value <> x` for a single element
    pub fn not_in_values(value: Value, mut values: Vec<Value>) -> Condition {
        if values.len() == 1
            && let Some(single) = values.pop()
        {
            return Condition::ne(value, single);
        }
        Condition::NotIn(value, InList::Values(values))
    }

    pub fn in_selection(value: Value, selection: Selection) -> Condition {
        Condition::In(value, InList::Selection(Box::new(selection)))
    }
}
