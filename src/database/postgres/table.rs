use serde_json::{json, Value};
use sqlx::{postgres::PgRow, FromRow, PgConnection};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;
use crate::types::ListParams;

/// Filter-driven reads over one table or view, run on the caller's connection.
///
/// `uuid_columns` names the columns of type `uuid`; every other string is
/// compared as text.
pub struct Table<T> {
    name: &'static str,
    uuid_columns: &'static [&'static str],
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Table<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub const fn new(name: &'static str, uuid_columns: &'static [&'static str]) -> Self {
        Self {
            name,
            uuid_columns,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, conn: &mut PgConnection, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.name)?
            .uuid_columns(self.uuid_columns)
            .filter(filter_data)?
            .select_all(conn)
            .await
    }

    pub async fn select_one(&self, conn: &mut PgConnection, where_clause: Value) -> Result<Option<T>, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(where_clause),
            limit: Some(1),
            ..Default::default()
        };
        QueryBuilder::<T>::new(self.name)?
            .uuid_columns(self.uuid_columns)
            .filter(filter)?
            .select_optional(conn)
            .await
    }

    pub async fn count(&self, conn: &mut PgConnection, where_clause: Value) -> Result<i64, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(where_clause),
            ..Default::default()
        };
        QueryBuilder::<T>::new(self.name)?
            .uuid_columns(self.uuid_columns)
            .filter(filter)?
            .count(conn)
            .await
    }

    /// One page plus the unpaged total. A search term matches `name` case-insensitively.
    pub async fn select_page(
        &self,
        conn: &mut PgConnection,
        mut where_clause: Value,
        order: &str,
        params: &ListParams,
    ) -> Result<(Vec<T>, i64), DatabaseError> {
        if let (Some(pattern), Value::Object(map)) = (params.search_pattern(), &mut where_clause) {
            map.insert("name".to_string(), json!({ "$ilike": pattern }));
        }

        let total = self.count(conn, where_clause.clone()).await?;
        let filter = FilterData {
            where_clause: Some(where_clause),
            order: Some(json!(order)),
            limit: Some(params.limit()),
            offset: Some(params.offset()),
        };
        let items = self.select_any(conn, filter).await?;
        Ok((items, total))
    }

    pub async fn select_ids(&self, conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let filter = FilterData {
            where_clause: Some(json!({ "id": { "$in": ids } })),
            ..Default::default()
        };
        self.select_any(conn, filter).await
    }
}
