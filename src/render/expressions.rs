//! Values, predicates and selections

use super::{RenderResult, SqlRenderer};
use crate::error::UnsupportedOperationError;
use crate::logical_plan::{
    ArithmeticOp, Condition, FieldRef, FunctionName, InList, JoinKind, Selection, Source,
    TimestampValue, Value,
};

impl SqlRenderer<'_> {
    pub(crate) fn field(&self, field: &FieldRef) -> String {
        match &field.dataset {
            Some(dataset) => format!("{}.{}", self.alias(dataset), self.identifier(&field.name)),
            None => self.identifier(&field.name),
        }
    }

    fn function_name(&self, function: FunctionName) -> RenderResult<&'static str> {
        self.sink
            .function_name(function)
            .ok_or_else(|| UnsupportedOperationError::Function {
                sink: self.sink.name(),
                function: function.ansi_name().to_string(),
            })
    }

    fn value_list(&self, values: &[Value], separator: &str) -> RenderResult<String> {
        Ok(values
            .iter()
            .map(|v| self.value(v))
            .collect::<RenderResult<Vec<_>>>()?
            .join(separator))
    }

    pub(crate) fn value(&self, value: &Value) -> RenderResult<String> {
        Ok(match value {
            Value::Field(field) => self.field(field),
            Value::All => "*".to_string(),
            Value::String(s) => quote_literal(s),
            Value::Integer(i) => i.to_string(),
            Value::Timestamp(TimestampValue::Literal(ts)) => self
                .sink
                .timestamp_literal(&ts.format(self.sink.timestamp_format()).to_string()),
            Value::Timestamp(TimestampValue::Pattern(pattern)) => {
                self.sink.timestamp_literal(&escape_literal(pattern))
            }
            Value::Raw(text) => text.clone(),
            Value::Json(text) => self.sink.json_literal(&quote_literal(text)),
            Value::Function(name, args) => format!(
                "{}({})",
                self.function_name(*name)?,
                self.value_list(args, ",")?
            ),
            Value::Subquery(selection) => format!("({})", self.selection(selection)?),
            Value::Arithmetic(left, op, right) => {
                let op = match op {
                    ArithmeticOp::Plus => "+",
                    ArithmeticOp::Minus => "-",
                };
                format!("{}{}{}", self.value(left)?, op, self.value(right)?)
            }
            Value::Case {
                when,
                then,
                otherwise,
            } => format!(
                "(CASE WHEN {} THEN {} ELSE {} END)",
                self.condition(when)?,
                self.value(then)?,
                self.value(otherwise)?
            ),
            Value::RowNumber {
                partition_by,
                order_by_desc,
            } => {
                let order = order_by_desc
                    .iter()
                    .map(|v| self.value(v).map(|s| format!("{} DESC", s)))
                    .collect::<RenderResult<Vec<_>>>()?;
                format!(
                    "{}() OVER (PARTITION BY {} ORDER BY {})",
                    self.function_name(FunctionName::RowNumber)?,
                    self.value_list(partition_by, ",")?,
                    order.join(",")
                )
            }
            Value::Aliased(inner, alias) => {
                format!("{} as {}", self.value(inner)?, self.identifier(alias))
            }
        })
    }

    /// Render a predicate; each child of AND and OR is parenthesised
    pub(crate) fn condition(&self, condition: &Condition) -> RenderResult<String> {
        Ok(match condition {
            Condition::And(parts) => self.junction(parts, " AND ")?,
            Condition::Or(parts) => self.junction(parts, " OR ")?,
            Condition::Not(inner) => format!("NOT ({})", self.condition(inner)?),
            Condition::Exists(selection) => format!("EXISTS ({})", self.selection(selection)?),
            Condition::Compare(left, comparator, right) => format!(
                "{} {} {}",
                self.value(left)?,
                comparator.as_str(),
                self.value(right)?
            ),
            Condition::In(value, list) => {
                format!("{} IN ({})", self.value(value)?, self.in_list(list)?)
            }
            Condition::NotIn(value, list) => {
                format!("{} NOT IN ({})", self.value(value)?, self.in_list(list)?)
            }
            Condition::IsNull(value) => format!("{} IS NULL", self.value(value)?),
        })
    }

    fn junction(&self, parts: &[Condition], separator: &str) -> RenderResult<String> {
        Ok(parts
            .iter()
            .map(|c| self.condition(c).map(|s| format!("({})", s)))
            .collect::<RenderResult<Vec<_>>>()?
            .join(separator))
    }

    fn in_list(&self, list: &InList) -> RenderResult<String> {
        match list {
            InList::Values(values) => self.value_list(values, ","),
            InList::Selection(selection) => self.selection(selection),
        }
    }

    pub(crate) fn assignments(&self, assignments: &[(FieldRef, Value)]) -> RenderResult<String> {
        Ok(assignments
            .iter()
            .map(|(field, value)| {
                self.value(value)
                    .map(|v| format!("{} = {}", self.field(field), v))
            })
            .collect::<RenderResult<Vec<_>>>()?
            .join(","))
    }

    /// `SELECT ...` without surrounding parentheses or alias
    pub(crate) fn selection(&self, selection: &Selection) -> RenderResult<String> {
        let mut sql = String::from("SELECT ");
        if selection.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.value_list(&selection.values, ",")?);
        if let Some(source) = &selection.source {
            sql.push_str(" FROM ");
            sql.push_str(&self.source(source)?);
        }
        if let Some(condition) = &selection.condition {
            sql.push_str(" WHERE ");
            sql.push_str(&self.condition(condition)?);
        }
        if !selection.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.value_list(&selection.group_by, ", ")?);
        }
        Ok(sql)
    }

    pub(crate) fn source(&self, source: &Source) -> RenderResult<String> {
        match source {
            Source::Table(table) => Ok(self.table_with_alias(table)),
            Source::Selection(selection) => {
                let inner = self.selection(selection)?;
                Ok(match &selection.alias {
                    Some(alias) => format!("({}) as {}", inner, self.alias(alias)),
                    None => format!("({})", inner),
                })
            }
            Source::Join(join) => {
                let kind = match join.kind {
                    JoinKind::Inner => "INNER JOIN",
                    JoinKind::LeftOuter => "LEFT OUTER JOIN",
                };
                Ok(format!(
                    "{} {} {} ON {}",
                    self.source(&join.left)?,
                    kind,
                    self.source(&join.right)?,
                    self.condition(&join.on)?
                ))
            }
        }
    }
}

/// Single-quoted SQL string literal
fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_literal(text))
}

/// Literal text with embedded quotes doubled, for callers that add the quotes
fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical_plan::{Comparator, TableRef};
    use crate::models::CaseConversion;
    use crate::sink::SinkKind;
    use chrono::NaiveDate;

    fn ansi() -> SqlRenderer<'static> {
        SqlRenderer::new(SinkKind::Ansi.sink(), CaseConversion::None)
    }

    #[test]
    fn test_nested_conjunction_parentheses() {
        let pk = Condition::And(vec![
            Condition::eq(Value::field("sink", "id"), Value::field("stage", "id")),
            Condition::eq(Value::field("sink", "name"), Value::field("stage", "name")),
        ]);
        let digest = Condition::ne(Value::field("sink", "digest"), Value::field("stage", "digest"));
        let condition = Condition::And(vec![pk, digest]);
        assert_eq!(
            ansi().condition(&condition).unwrap(),
            "((sink.\"id\" = stage.\"id\") AND (sink.\"name\" = stage.\"name\")) AND (sink.\"digest\" <> stage.\"digest\")"
        );
    }

    #[test]
    fn test_in_values_and_single_value() {
        let many = Condition::not_in_values(
            Value::field("stage", "delete_indicator"),
            vec![Value::string("yes"), Value::string("1")],
        );
        assert_eq!(
            ansi().condition(&many).unwrap(),
            "stage.\"delete_indicator\" NOT IN ('yes','1')"
        );
        let single = Condition::in_values(Value::field("stage", "flag"), vec![Value::string("Y")]);
        assert_eq!(ansi().condition(&single).unwrap(), "stage.\"flag\" = 'Y'");
    }

    #[test]
    fn test_timestamp_literals_per_sink() {
        let ts = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let value = Value::Timestamp(TimestampValue::Literal(ts));
        assert_eq!(ansi().value(&value).unwrap(), "'2000-01-01 00:00:00'");
        let bigquery = SqlRenderer::new(SinkKind::Bigquery.sink(), CaseConversion::None);
        assert_eq!(
            bigquery.value(&value).unwrap(),
            "PARSE_DATETIME('%Y-%m-%d %H:%M:%S','2000-01-01 00:00:00')"
        );
        let memsql = SqlRenderer::new(SinkKind::Memsql.sink(), CaseConversion::None);
        assert_eq!(memsql.value(&value).unwrap(), "'2000-01-01 00:00:00.000000'");
    }

    #[test]
    fn test_derived_table_and_join() {
        let left = Selection::from(
            TableRef::new("staging").with_alias("stage"),
            vec![Value::field("stage", "id")],
        )
        .alias("x");
        let right = TableRef::new("main").with_alias("y");
        let source = Source::join(
            left.into(),
            JoinKind::LeftOuter,
            right.into(),
            Condition::compare(
                Value::field("x", "id"),
                Comparator::Eq,
                Value::field("y", "id"),
            ),
        );
        let selection = Selection::from(source, vec![Value::field("x", "id")]);
        assert_eq!(
            ansi().selection(&selection).unwrap(),
            "SELECT x.\"id\" FROM (SELECT stage.\"id\" FROM staging as stage) as x LEFT OUTER JOIN main as y ON x.\"id\" = y.\"id\""
        );
    }

    #[test]
    fn test_row_number_and_alias() {
        let value = Value::RowNumber {
            partition_by: vec![Value::field("stage", "id"), Value::field("stage", "name")],
            order_by_desc: vec![Value::field("stage", "version")],
        }
        .alias("row_num");
        assert_eq!(
            ansi().value(&value).unwrap(),
            "ROW_NUMBER() OVER (PARTITION BY stage.\"id\",stage.\"name\" ORDER BY stage.\"version\" DESC) as \"row_num\""
        );
    }

    #[test]
    fn test_string_literal_escaping() {
        assert_eq!(ansi().value(&Value::string("it's")).unwrap(), "'it''s'");
    }

    #[test]
    fn test_timestamp_pattern_escaping() {
        let value = Value::Timestamp(TimestampValue::Pattern("{BATCH_'START'}".to_string()));
        assert_eq!(ansi().value(&value).unwrap(), "'{BATCH_''START''}'");
        let bigquery = SqlRenderer::new(SinkKind::Bigquery.sink(), CaseConversion::None);
        assert_eq!(
            bigquery.value(&value).unwrap(),
            "PARSE_DATETIME('%Y-%m-%d %H:%M:%S','{BATCH_''START''}')"
        );
    }
}
