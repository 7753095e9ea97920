//! JSON filter to parameterised SQL.
//!
//! A [`FilterData`] (`where`, `order`, `limit`, `offset`) is validated
//! against identifier rules and rendered as `$n` placeholders plus the
//! values to bind. Column and table names never come from user input
//! without passing `is_identifier`.

pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

use thiserror::Error;

pub use filter::Filter;
pub use types::*;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid WHERE clause: {0}")]
    InvalidWhereClause(String),

    #[error("Invalid ORDER clause: {0}")]
    InvalidOrder(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    /// Negative limit or offset.
    #[error("Invalid paging: {0}")]
    InvalidPaging(String),
}
