use serde_json::Value;

use super::FilterError;

/// Field operator inside a `where` object, e.g. `{ "name": { "$ilike": "%a%" } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    In,
    NIn,
    Between,
}

impl FilterOp {
    pub fn from_key(key: &str) -> Result<Self, FilterError> {
        Ok(match key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    /// SQL operator for the single-value comparisons.
    pub fn binary_sql(&self) -> Option<&'static str> {
        match self {
            FilterOp::Eq => Some("="),
            FilterOp::Ne => Some("<>"),
            FilterOp::Gt => Some(">"),
            FilterOp::Gte => Some(">="),
            FilterOp::Lt => Some("<"),
            FilterOp::Lte => Some("<="),
            FilterOp::Like => Some("LIKE"),
            FilterOp::ILike => Some("ILIKE"),
            FilterOp::In | FilterOp::NIn | FilterOp::Between => None,
        }
    }
}

/// What a repository asks of one table: conditions, ordering and a page window.
#[derive(Debug, Clone, Default)]
pub struct FilterData {
    pub where_clause: Option<Value>,
    /// `"name asc, id asc"`, `["name asc"]` or `{ "name": "asc" }`.
    pub order: Option<Value>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// One parsed `where` entry. Logical groups (`$and`, `$or`, `$not`) are
/// rendered eagerly and kept as [`Condition::Sql`].
#[derive(Debug, Clone)]
pub enum Condition {
    Field { column: String, op: FilterOp, data: Value },
    Sql(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(dir: &str) -> Self {
        if dir.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderTerm {
    pub column: String,
    pub sort: SortDirection,
}

/// Rendered statement with its positional parameters.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
