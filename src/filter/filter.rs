use serde_json::Value;

use super::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, OrderTerm, SqlResult};

/// SELECT / COUNT builder over a single table or view.
pub struct Filter {
    table_name: String,
    uuid_columns: &'static [&'static str],
    where_data: Option<Value>,
    order: Vec<OrderTerm>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            uuid_columns: &[],
            where_data: None,
            order: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(&order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        Ok(self)
    }

    /// Columns whose values are compared as `uuid` rather than text.
    pub fn uuid_columns(&mut self, columns: &'static [&'static str]) -> &mut Self {
        self.uuid_columns = columns;
        self
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order: &Value) -> Result<&mut Self, FilterError> {
        self.order = FilterOrder::parse(order)?;
        Ok(self)
    }

    /// Limits above the configured ceiling are capped rather than rejected.
    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidPaging(format!("limit {}", limit)));
        }
        if let Some(off) = offset.filter(|off| *off < 0) {
            return Err(FilterError::InvalidPaging(format!("offset {}", off)));
        }

        let settings = &crate::config::CONFIG.filter;
        let max_limit = settings.max_limit.unwrap_or(i32::MAX);
        if limit > max_limit && settings.debug_logging {
            tracing::warn!(limit, max_limit, "capping filter limit");
        }

        self.limit = Some(limit.min(max_limit));
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let SqlResult { query: where_sql, params } = self.to_where_sql()?;

        let mut query = format!("SELECT * FROM \"{}\"", self.table_name);
        if !where_sql.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&where_sql);
        }
        let order_clause = FilterOrder::generate(&self.order);
        if !order_clause.is_empty() {
            query.push(' ');
            query.push_str(&order_clause);
        }
        if let Some(limit) = self.limit {
            query.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = self.offset {
                query.push_str(&format!(" OFFSET {}", offset));
            }
        }

        Ok(SqlResult { query, params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, 0, self.uuid_columns)?,
            None => (String::new(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let SqlResult { query: where_sql, params } = self.to_where_sql()?;
        let mut query = format!("SELECT COUNT(*) as count FROM \"{}\"", self.table_name);
        if !where_sql.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&where_sql);
        }
        Ok(SqlResult { query, params })
    }
}

/// Table and column names: ASCII letters, digits and underscores, not starting with a digit.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
