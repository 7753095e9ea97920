use serde_json::{Map, Value};

use super::FilterError;
use super::filter::is_identifier;
use super::types::{Condition, FilterOp};

/// Renders a `where` object into a boolean SQL expression.
///
/// Sibling keys are joined with `AND`. `$and` / `$or` take an array of
/// nested objects, `$not` a single one. Placeholders continue from the
/// index the caller passes, so nested groups share one parameter list.
/// Values are bound as they come from JSON; placeholders compared against
/// a column listed in `uuid_columns` carry a `::uuid` cast.
pub struct FilterWhere<'a> {
    params: Vec<Value>,
    next_index: usize,
    uuid_columns: &'a [&'a str],
}

impl<'a> FilterWhere<'a> {
    /// Renders the conditions with placeholders numbered from `starting_param_index + 1`.
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        uuid_columns: &'a [&'a str],
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut renderer = Self {
            params: vec![],
            next_index: starting_param_index,
            uuid_columns,
        };
        let sql = renderer.render(where_data)?;
        Ok((sql, renderer.params))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn render(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let conditions = match where_data {
            Value::Null => vec![],
            Value::Object(obj) => self.parse_object(obj)?,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            parts.push(match condition {
                Condition::Sql(sql) => sql,
                Condition::Field { column, op, data } => self.render_field(&column, op, data)?,
            });
        }
        Ok(if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") })
    }

    fn parse_object(&mut self, obj: &Map<String, Value>) -> Result<Vec<Condition>, FilterError> {
        let mut conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                conditions.push(Condition::Sql(self.render_logical(key, value)?));
                continue;
            }
            if !is_identifier(key) {
                return Err(FilterError::InvalidColumn(key.to_string()));
            }
            match value {
                Value::Object(ops) => {
                    for (op_key, data) in ops {
                        conditions.push(Condition::Field {
                            column: key.clone(),
                            op: FilterOp::from_key(op_key)?,
                            data: data.clone(),
                        });
                    }
                }
                // { field: value } means equality
                _ => conditions.push(Condition::Field {
                    column: key.clone(),
                    op: FilterOp::Eq,
                    data: value.clone(),
                }),
            }
        }
        Ok(conditions)
    }

    fn render_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let clauses = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if clauses.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!("{} requires at least one clause", op)));
                }
                let mut rendered = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    rendered.push(format!("({})", self.render(clause)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", rendered.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.render(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn render_field(&mut self, column: &str, op: FilterOp, data: Value) -> Result<String, FilterError> {
        let cast = if self.uuid_columns.iter().any(|c| *c == column) { "::uuid" } else { "" };
        let column = format!("\"{}\"", column);
        match (op, data) {
            (FilterOp::Eq, Value::Null) => Ok(format!("{} IS NULL", column)),
            (FilterOp::Ne, Value::Null) => Ok(format!("{} IS NOT NULL", column)),
            (FilterOp::In | FilterOp::NIn, Value::Array(values)) => {
                let negate = op == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let placeholders: Vec<String> = values.into_iter().map(|v| self.param(v, cast)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                Ok(format!("{} {} ({})", column, keyword, placeholders.join(", ")))
            }
            (FilterOp::In | FilterOp::NIn, scalar) => {
                let sql_op = if op == FilterOp::NIn { "<>" } else { "=" };
                Ok(format!("{} {} {}", column, sql_op, self.param(scalar, cast)))
            }
            (FilterOp::Between, Value::Array(values)) if values.len() == 2 => {
                let mut bounds = values.into_iter();
                let low = bounds.next().unwrap_or(Value::Null);
                let high = bounds.next().unwrap_or(Value::Null);
                Ok(format!("{} BETWEEN {} AND {}", column, self.param(low, cast), self.param(high, cast)))
            }
            (FilterOp::Between, _) => Err(FilterError::InvalidOperatorData(
                "$between requires array with 2 values".to_string(),
            )),
            (op, data) => match op.binary_sql() {
                Some(sql_op) => Ok(format!("{} {} {}", column, sql_op, self.param(data, cast))),
                None => Err(FilterError::InvalidOperatorData(format!("{:?} cannot take this value", op))),
            },
        }
    }

    fn param(&mut self, value: Value, cast: &str) -> String {
        self.params.push(value);
        self.next_index += 1;
        format!("${}{}", self.next_index, cast)
    }
}
