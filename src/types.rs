/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

use crate::config;

/// Pagination and search parameters accepted by every list operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    /// Case-insensitive substring match on the entity name.
    pub search: Option<String>,
}

impl ListParams {
    pub fn new(limit: i32, offset: i32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Limit after applying the configured default and ceiling.
    pub fn limit(&self) -> i32 {
        let filter = &config::config().filter;
        let max = filter.max_limit.unwrap_or(i32::MAX);
        self.limit.unwrap_or(filter.default_limit).clamp(0, max)
    }

    pub fn offset(&self) -> i32 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Trimmed search term, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// `ILIKE` pattern for the search term with wildcards escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search_term().map(|term| {
            let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }

    /// In-process equivalent of the `ILIKE` search.
    pub fn matches(&self, name: &str) -> bool {
        match self.search_term() {
            Some(term) => name.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }
}

/// One page of a list result.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i32,
    pub offset: i32,
}

impl<T: Serialize> Paged<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        }
    }

    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        let filter = &config::config().filter;
        assert_eq!(ListParams::default().limit(), filter.default_limit);
        let huge = ListParams::new(i32::MAX, 0);
        assert_eq!(huge.limit(), filter.max_limit.unwrap_or(i32::MAX));
        assert_eq!(ListParams::new(-5, -1).limit(), 0);
        assert_eq!(ListParams::new(10, -1).offset(), 0);
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let params = ListParams::default().with_search(" 50%_off ");
        assert_eq!(params.search_pattern().as_deref(), Some("%50\\%\\_off%"));
        assert!(ListParams::default().with_search("   ").search_pattern().is_none());
    }

    #[test]
    fn matches_is_case_insensitive() {
        let params = ListParams::default().with_search("CORE");
        assert!(params.matches("Platform core"));
        assert!(!params.matches("Billing"));
        assert!(ListParams::default().matches("anything"));
    }
}
