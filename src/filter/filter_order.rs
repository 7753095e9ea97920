use serde_json::Value;

use super::FilterError;
use super::filter::is_identifier;
use super::types::{OrderTerm, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"a asc, b desc"`, an array of such strings, or `{ "a": "desc" }`.
    pub fn parse(order: &Value) -> Result<Vec<OrderTerm>, FilterError> {
        let terms: Vec<OrderTerm> = match order {
            Value::String(s) => Self::parse_terms(s).collect(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .flat_map(Self::parse_terms)
                .collect(),
            Value::Object(obj) => obj
                .iter()
                .map(|(column, dir)| OrderTerm {
                    column: column.clone(),
                    sort: SortDirection::parse(dir.as_str().unwrap_or("asc")),
                })
                .collect(),
            Value::Null => vec![],
            _ => return Err(FilterError::InvalidOrder("ORDER must be a string, array or object".to_string())),
        };

        match terms.iter().find(|t| !is_identifier(&t.column)) {
            Some(bad) => Err(FilterError::InvalidColumn(bad.column.clone())),
            None => Ok(terms),
        }
    }

    fn parse_terms(s: &str) -> impl Iterator<Item = OrderTerm> + '_ {
        s.split(',').filter_map(|part| {
            let mut words = part.split_whitespace();
            let column = words.next()?;
            Some(OrderTerm {
                column: column.to_string(),
                sort: SortDirection::parse(words.next().unwrap_or("asc")),
            })
        })
    }

    pub fn generate(terms: &[OrderTerm]) -> String {
        if terms.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = terms
            .iter()
            .map(|t| format!("\"{}\" {}", t.column, t.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
