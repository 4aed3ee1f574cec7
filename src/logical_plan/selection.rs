//! SELECT statements and the sources they read from

use super::conditions::Condition;
use super::values::Value;
use crate::models::Dataset;

/// Reference to a physical table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub database: Option<String>,
    pub group: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// Reference `dataset`, using its own alias or `default_alias`
    pub fn from_dataset(dataset: &Dataset, default_alias: &str) -> Self {
        Self {
            database: dataset.database.clone(),
            group: dataset.group.clone(),
            name: dataset.name.clone(),
            alias: Some(dataset.alias_or(default_alias).to_string()),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            group: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Same table without an alias, as used by INSERT and DDL targets
    pub fn unaliased(&self) -> Self {
        Self {
            alias: None,
            ..self.clone()
        }
    }

    /// Alias used to qualify columns of this table
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: Source,
    pub right: Source,
    pub kind: JoinKind,
    pub on: Condition,
}

/// The FROM clause of a selection
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(TableRef),
    /// Derived table, rendered with the selection's alias
    Selection(Box<Selection>),
    Join(Box<Join>),
}

impl Source {
    pub fn join(left: Source, kind: JoinKind, right: Source, on: Condition) -> Source {
        Source::Join(Box::new(Join {
            left,
            right,
            kind,
            on,
        }))
    }
}

impl From<TableRef> for Source {
    fn from(table: TableRef) -> Self {
        Source::Table(table)
    }
}

impl From<Selection> for Source {
    fn from(selection: Selection) -> Self {
        Source::Selection(Box::new(selection))
    }
}

/// A SELECT
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub distinct: bool,
    pub values: Vec<Value>,
    pub source: Option<Source>,
    pub condition: Option<Condition>,
    pub group_by: Vec<Value>,
    /// Alias when used as a derived table
    pub alias: Option<String>,
}

impl Selection {
    /// `SELECT values FROM source`
    pub fn from(source: impl Into<Source>, values: Vec<Value>) -> Self {
        Self {
            values,
            source: Some(source.into()),
            ..Default::default()
        }
    }

    /// `SELECT * FROM source`
    pub fn all_from(source: impl Into<Source>) -> Self {
        Self::from(source, vec![Value::All])
    }

    /// `SELECT values` with no FROM clause
    pub fn values(values: Vec<Value>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    pub fn filter(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn group_by(mut self, values: Vec<Value>) -> Self {
        self.group_by = values;
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}
