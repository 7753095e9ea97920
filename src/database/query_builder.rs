use serde_json::Value;
use sqlx::{self, postgres::PgArguments, FromRow, PgConnection, Row};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterData, SqlResult};

/// Typed SELECT/COUNT over one table (or view) driven by a [`FilterData`].
pub struct QueryBuilder<T> {
    table_name: String,
    uuid_columns: &'static [&'static str],
    filter: Option<Filter>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let name = table_name.into();
        // Reuse Filter table name validation
        Filter::new(&name)?;
        Ok(Self {
            table_name: name,
            uuid_columns: &[],
            filter: None,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Must be set before [`QueryBuilder::filter`].
    pub fn uuid_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.uuid_columns = columns;
        self
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        let mut filter = Filter::new(&self.table_name)?;
        filter.uuid_columns(self.uuid_columns).assign(filter_data)?;
        self.filter = Some(filter);
        Ok(self)
    }

    pub async fn select_all(self, conn: &mut PgConnection) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        log_query(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(&mut *conn).await?;
        Ok(rows)
    }

    pub async fn select_optional(self, conn: &mut PgConnection) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        log_query(&sql_result);
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let row = q.fetch_optional(&mut *conn).await?;
        Ok(row)
    }

    pub async fn count(self, conn: &mut PgConnection) -> Result<i64, DatabaseError> {
        let sql_result = match self.filter {
            Some(filter) => filter.to_count_sql()?,
            None => SqlResult { query: format!("SELECT COUNT(*) as count FROM \"{}\"", self.table_name), params: vec![] },
        };
        log_query(&sql_result);

        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&mut *conn).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    fn sql_result(&self) -> Result<SqlResult, DatabaseError> {
        match &self.filter {
            Some(filter) => Ok(filter.to_sql()?),
            None => Ok(SqlResult { query: format!("SELECT * FROM \"{}\"", self.table_name), params: vec![] }),
        }
    }
}

fn log_query(sql_result: &SqlResult) {
    if crate::config::CONFIG.filter.debug_logging {
        tracing::debug!(query = %sql_result.query, params = sql_result.params.len(), "filter query");
    }
}

/// Strings always bind as text. Comparisons against uuid columns carry an
/// explicit cast in the rendered SQL.
enum BindValue<'q> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'q str),
    Json(Value),
}

impl<'q> BindValue<'q> {
    fn from_json(v: &'q Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    BindValue::Float(f)
                } else {
                    BindValue::Json(v.clone())
                }
            }
            Value::String(s) => BindValue::Text(s),
            // Arrays are expanded by FilterWhere before binding
            Value::Array(_) | Value::Object(_) => BindValue::Json(v.clone()),
        }
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match BindValue::from_json(v) {
        BindValue::Null => q.bind(None::<String>),
        BindValue::Bool(b) => q.bind(b),
        BindValue::Int(i) => q.bind(i),
        BindValue::Float(f) => q.bind(f),
        BindValue::Text(s) => q.bind(s),
        BindValue::Json(j) => q.bind(j),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match BindValue::from_json(v) {
        BindValue::Null => q.bind(None::<String>),
        BindValue::Bool(b) => q.bind(b),
        BindValue::Int(i) => q.bind(i),
        BindValue::Float(f) => q.bind(f),
        BindValue::Text(s) => q.bind(s),
        BindValue::Json(j) => q.bind(j),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uuid_shaped_strings_stay_text() {
        let v = json!("0f8fad5b-d9cb-469f-a165-70867728950e");
        assert!(matches!(BindValue::from_json(&v), BindValue::Text("0f8fad5b-d9cb-469f-a165-70867728950e")));
        let v = json!("%core%");
        assert!(matches!(BindValue::from_json(&v), BindValue::Text("%core%")));
        let v = json!(42);
        assert!(matches!(BindValue::from_json(&v), BindValue::Int(42)));
    }

    #[test]
    fn rejects_invalid_table() {
        assert!(QueryBuilder::<crate::database::models::Team>::new("teams--").is_err());
    }
}
