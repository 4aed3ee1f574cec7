//! SQL rendering
//!
//! [`SqlRenderer`] turns a [`LogicalPlan`] into SQL text for one [`Sink`].
//! Statements are rendered here; values, predicates and selections live in
//! [`expressions`].

mod expressions;

use crate::error::UnsupportedOperationError;
use crate::logical_plan::{AlterKind, LogicalPlan, Merge, Operation, TableRef};
use crate::models::{CaseConversion, Column};
use crate::sink::{AlterColumnSyntax, Capability, Sink};

/// Renders logical plans for a sink
#[derive(Debug, Clone, Copy)]
pub struct SqlRenderer<'a> {
    sink: &'a dyn Sink,
    case_conversion: CaseConversion,
}

pub type RenderResult<T> = Result<T, UnsupportedOperationError>;

impl<'a> SqlRenderer<'a> {
    pub fn new(sink: &'a dyn Sink, case_conversion: CaseConversion) -> Self {
        Self {
            sink,
            case_conversion,
        }
    }

    pub fn sink(&self) -> &'a dyn Sink {
        self.sink
    }

    /// Render every operation of `plan`, in order
    pub fn render_plan(&self, plan: &LogicalPlan) -> RenderResult<Vec<String>> {
        plan.operations
            .iter()
            .map(|op| self.render_operation(op))
            .collect()
    }

    pub fn render_operation(&self, operation: &Operation) -> RenderResult<String> {
        match operation {
            Operation::Create {
                table,
                columns,
                if_not_exists,
            } => Ok(self.create(table, columns, *if_not_exists)),
            Operation::Drop { table, if_exists } => Ok(format!(
                "DROP TABLE {}{}",
                if *if_exists { "IF EXISTS " } else { "" },
                self.table_name(table)
            )),
            Operation::Delete { table, condition } => {
                let mut sql = format!("DELETE FROM {}", self.table_with_alias(table));
                if let Some(condition) = condition {
                    sql.push_str(" WHERE ");
                    sql.push_str(&self.condition(condition)?);
                }
                Ok(sql)
            }
            Operation::Update {
                table,
                assignments,
                condition,
            } => {
                let mut sql = format!(
                    "UPDATE {} SET {}",
                    self.table_with_alias(table),
                    self.assignments(assignments)?
                );
                if let Some(condition) = condition {
                    sql.push_str(" WHERE ");
                    sql.push_str(&self.condition(condition)?);
                }
                Ok(sql)
            }
            Operation::Insert {
                table,
                columns,
                source,
            } => Ok(format!(
                "INSERT INTO {} ({}) ({})",
                self.table_name(table),
                self.identifier_list(columns),
                self.selection(source)?
            )),
            Operation::Merge(merge) => self.merge(merge),
            Operation::Alter {
                table,
                kind,
                column,
            } => self.alter(table, *kind, column),
            Operation::Select(selection) => self.selection(selection),
        }
    }

    fn create(&self, table: &TableRef, columns: &[Column], if_not_exists: bool) -> String {
        let mut defs: Vec<String> = columns.iter().map(|c| self.column_definition(c)).collect();
        let keys: Vec<String> = columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| self.identifier(&c.name))
            .collect();
        if !keys.is_empty() {
            defs.push(format!(
                "PRIMARY KEY ({}){}",
                keys.join(", "),
                self.sink.primary_key_suffix()
            ));
        }
        format!(
            "{} {}{}({})",
            self.sink.create_table_keyword(),
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            self.table_name(table),
            defs.join(",")
        )
    }

    fn merge(&self, merge: &Merge) -> RenderResult<String> {
        if !self.sink.supports(Capability::Merge) {
            return Err(UnsupportedOperationError::Capability {
                sink: self.sink.name(),
                capability: Capability::Merge.to_string(),
            });
        }
        let mut sql = format!(
            "MERGE INTO {} USING {} ON {}",
            self.table_with_alias(&merge.target),
            self.source(&merge.source)?,
            self.condition(&merge.on)?
        );
        sql.push_str(" WHEN MATCHED");
        if let Some(condition) = &merge.matched_condition {
            sql.push_str(" AND ");
            sql.push_str(&self.condition(condition)?);
        }
        sql.push_str(" THEN UPDATE SET ");
        sql.push_str(&self.assignments(&merge.assignments)?);

        let values = merge
            .insert_values
            .iter()
            .map(|v| self.value(v))
            .collect::<RenderResult<Vec<_>>>()?;
        sql.push_str(" WHEN NOT MATCHED");
        if let Some(condition) = &merge.not_matched_condition {
            sql.push_str(" AND ");
            sql.push_str(&self.condition(condition)?);
        }
        sql.push_str(&format!(
            " THEN INSERT ({}) VALUES ({})",
            self.identifier_list(&merge.insert_columns),
            values.join(",")
        ));
        Ok(sql)
    }

    fn alter(&self, table: &TableRef, kind: AlterKind, column: &Column) -> RenderResult<String> {
        let required = match kind {
            AlterKind::AddColumn => Some(Capability::AddColumn),
            AlterKind::ChangeDatatype
                if !self.sink.supports(Capability::ExplicitDataTypeConversion) =>
            {
                Some(Capability::DataSizingChanges)
            }
            AlterKind::ChangeDatatype | AlterKind::NullableColumn => None,
        };
        if let Some(required) = required
            && !self.sink.supports(required)
        {
            return Err(UnsupportedOperationError::Capability {
                sink: self.sink.name(),
                capability: required.to_string(),
            });
        }

        let target = self.table_name(table);
        let name = self.identifier(&column.name);
        let data_type = self.data_type(column);
        let change = match (kind, self.sink.alter_column_syntax()) {
            (AlterKind::AddColumn, _) => {
                format!("ADD COLUMN {}", self.column_definition(column))
            }
            (AlterKind::ChangeDatatype, AlterColumnSyntax::AlterColumn) => {
                format!("ALTER COLUMN {} {}", name, data_type)
            }
            (AlterKind::ChangeDatatype, AlterColumnSyntax::ModifyColumn)
            | (AlterKind::NullableColumn, AlterColumnSyntax::ModifyColumn) => {
                format!("MODIFY COLUMN {} {}", name, data_type)
            }
            (AlterKind::ChangeDatatype, AlterColumnSyntax::SetDataType) => {
                format!("ALTER COLUMN {} SET DATA TYPE {}", name, data_type)
            }
            (AlterKind::NullableColumn, _) => format!("ALTER COLUMN {} DROP NOT NULL", name),
        };
        Ok(format!("ALTER TABLE {} {}", target, change))
    }

    fn column_definition(&self, column: &Column) -> String {
        let mut def = format!("{} {}", self.identifier(&column.name), self.data_type(column));
        if !column.is_nullable() {
            def.push_str(" NOT NULL");
        }
        def
    }

    fn data_type(&self, column: &Column) -> String {
        let name = self.sink.data_type_name(column.data_type);
        match (column.length, column.scale) {
            (Some(length), Some(scale)) => format!("{}({},{})", name, length, scale),
            (Some(length), None) => format!("{}({})", name, length),
            _ => name.to_string(),
        }
    }

    /// Quoted identifier after case conversion
    pub(crate) fn identifier(&self, name: &str) -> String {
        let quote = self.sink.quote_char();
        format!("{}{}{}", quote, self.case_conversion.apply(name), quote)
    }

    /// Unquoted dataset alias after case conversion
    pub(crate) fn alias(&self, alias: &str) -> String {
        self.case_conversion.apply(alias)
    }

    fn identifier_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.identifier(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fully qualified table name without its alias
    pub(crate) fn table_name(&self, table: &TableRef) -> String {
        if table.database.is_none() && table.group.is_none() && !self.sink.quote_bare_table_names()
        {
            return self.case_conversion.apply(&table.name);
        }
        [table.database.as_deref(), table.group.as_deref(), Some(&table.name)]
            .into_iter()
            .flatten()
            .map(|part| self.identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn table_with_alias(&self, table: &TableRef) -> String {
        match &table.alias {
            Some(alias) => format!("{} as {}", self.table_name(table), self.alias(alias)),
            None => self.table_name(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical_plan::{Condition, FieldRef, Selection, Value};
    use crate::models::DataType;
    use crate::sink::SinkKind;

    fn main_table() -> TableRef {
        TableRef {
            database: Some("mydb".to_string()),
            group: None,
            name: "main".to_string(),
            alias: Some("sink".to_string()),
        }
    }

    #[test]
    fn test_create_with_primary_keys() {
        let renderer = SqlRenderer::new(SinkKind::Ansi.sink(), CaseConversion::None);
        let op = Operation::Create {
            table: main_table().unaliased(),
            columns: vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("name", DataType::Varchar).primary_key(),
                Column::new("amount", DataType::Double),
            ],
            if_not_exists: true,
        };
        assert_eq!(
            renderer.render_operation(&op).unwrap(),
            "CREATE TABLE IF NOT EXISTS \"mydb\".\"main\"(\"id\" INTEGER NOT NULL,\"name\" VARCHAR NOT NULL,\"amount\" DOUBLE,PRIMARY KEY (\"id\", \"name\"))"
        );
    }

    #[test]
    fn test_bigquery_create_uses_backticks_and_not_enforced() {
        let renderer = SqlRenderer::new(SinkKind::Bigquery.sink(), CaseConversion::None);
        let op = Operation::Create {
            table: TableRef::new("main"),
            columns: vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("name", DataType::Varchar).with_length(64),
            ],
            if_not_exists: true,
        };
        assert_eq!(
            renderer.render_operation(&op).unwrap(),
            "CREATE TABLE IF NOT EXISTS `main`(`id` INT64 NOT NULL,`name` STRING(64),PRIMARY KEY (`id`) NOT ENFORCED)"
        );
    }

    #[test]
    fn test_update_with_upper_case() {
        let renderer = SqlRenderer::new(SinkKind::Ansi.sink(), CaseConversion::ToUpper);
        let op = Operation::Update {
            table: main_table(),
            assignments: vec![(FieldRef::new("sink", "batch_id_out"), Value::Integer(5))],
            condition: Some(Condition::eq(
                Value::field("sink", "batch_id_out"),
                Value::Integer(999999999),
            )),
        };
        assert_eq!(
            renderer.render_operation(&op).unwrap(),
            "UPDATE \"MYDB\".\"MAIN\" as SINK SET SINK.\"BATCH_ID_OUT\" = 5 WHERE SINK.\"BATCH_ID_OUT\" = 999999999"
        );
    }

    #[test]
    fn test_merge_requires_capability() {
        let renderer = SqlRenderer::new(SinkKind::Ansi.sink(), CaseConversion::None);
        let op = Operation::Merge(Box::new(Merge {
            target: main_table(),
            source: TableRef::new("staging").with_alias("stage").into(),
            on: Condition::eq(Value::field("sink", "id"), Value::field("stage", "id")),
            matched_condition: None,
            assignments: Vec::new(),
            not_matched_condition: None,
            insert_columns: Vec::new(),
            insert_values: Vec::new(),
        }));
        let err = renderer.render_operation(&op).unwrap_err();
        assert_eq!(err.to_string(), "Capability MERGE is not supported by sink ansi");
    }

    #[test]
    fn test_alter_syntax_per_sink() {
        let column = Column::new("amount", DataType::Decimal).with_length(10).with_scale(2);
        let op = Operation::Alter {
            table: main_table().unaliased(),
            kind: AlterKind::ChangeDatatype,
            column,
        };
        let ansi = SqlRenderer::new(SinkKind::Ansi.sink(), CaseConversion::None);
        assert_eq!(
            ansi.render_operation(&op).unwrap(),
            "ALTER TABLE \"mydb\".\"main\" ALTER COLUMN \"amount\" DECIMAL(10,2)"
        );
        let memsql = SqlRenderer::new(SinkKind::Memsql.sink(), CaseConversion::None);
        assert_eq!(
            memsql.render_operation(&op).unwrap(),
            "ALTER TABLE `mydb`.`main` MODIFY COLUMN `amount` DECIMAL(10,2)"
        );
        let snowflake = SqlRenderer::new(SinkKind::Snowflake.sink(), CaseConversion::None);
        assert_eq!(
            snowflake.render_operation(&op).unwrap(),
            "ALTER TABLE \"mydb\".\"main\" ALTER COLUMN \"amount\" SET DATA TYPE DECIMAL(10,2)"
        );
    }

    #[test]
    fn test_insert_select() {
        let renderer = SqlRenderer::new(SinkKind::Ansi.sink(), CaseConversion::None);
        let staging = TableRef::new("staging").with_alias("stage");
        let op = Operation::Insert {
            table: TableRef::new("main"),
            columns: vec!["id".to_string(), "name".to_string()],
            source: Selection::from(
                staging,
                vec![Value::field("stage", "id"), Value::field("stage", "name")],
            ),
        };
        assert_eq!(
            renderer.render_operation(&op).unwrap(),
            "INSERT INTO main (\"id\", \"name\") (SELECT stage.\"id\",stage.\"name\" FROM staging as stage)"
        );
    }
}
