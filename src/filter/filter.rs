use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{SortKey, SqlResult, SqlValue};

/// Category/difficulty value meaning "no filter"
const ALL: &str = "Todos";

/// Ceiling for `page` and `offset`; keeps `(page - 1) * limit` inside `i64`
const MAX_POSITION: i64 = 1_000_000_000;

/// Raw listing query string. Everything stays a string so that garbage
/// (`?page=abc`) falls back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Normalized listing request
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
    pub sort: SortKey,
}

impl ListFilter {
    pub fn from_query(query: &ListQuery, default_limit: i64, max_limit: i64) -> Self {
        let limit = parse_number(&query.limit)
            .unwrap_or(default_limit)
            .clamp(1, max_limit.max(1));

        // page/limit wins; offset/limit is accepted when no page was given
        let (page, offset) = match (parse_number(&query.page), parse_number(&query.offset)) {
            (Some(page), _) => {
                let page = page.clamp(1, MAX_POSITION);
                (page, (page - 1).saturating_mul(limit))
            }
            (None, Some(offset)) => {
                let offset = offset.clamp(0, MAX_POSITION);
                (offset / limit + 1, offset)
            }
            (None, None) => (1, 0),
        };

        Self {
            page,
            limit,
            offset,
            category: selector(&query.category),
            difficulty: selector(&query.difficulty),
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort: query.sort.as_deref().map(SortKey::parse).unwrap_or_default(),
        }
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination::new(self.page, self.limit, total)
    }
}

fn parse_number(raw: &Option<String>) -> Option<i64> {
    raw.as_deref().and_then(|s| s.trim().parse::<i64>().ok())
}

fn selector(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ALL)
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let limit = limit.max(1);
        let total = total.max(0);
        let total_pages = (total + limit - 1) / limit;
        Self {
            current_page: page,
            total_pages,
            total_count: total,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
            limit,
        }
    }
}

/// SQL for one page of a listing: `SELECT <select> FROM <table> <alias> <joins> WHERE ... ORDER BY ... LIMIT/OFFSET`
pub struct Filter {
    table_name: String,
    alias: String,
    select_clause: String,
    join_clause: String,
    list: Option<ListFilter>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>, alias: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        let alias = alias.into();
        Self::validate_identifier(&table_name).map_err(FilterError::InvalidTableName)?;
        Self::validate_identifier(&alias).map_err(FilterError::InvalidTableName)?;
        Ok(Self {
            select_clause: format!("{}.*", alias),
            table_name,
            alias,
            join_clause: String::new(),
            list: None,
        })
    }

    pub fn select(mut self, select_clause: impl Into<String>) -> Self {
        self.select_clause = select_clause.into();
        self
    }

    pub fn join(mut self, join_clause: impl Into<String>) -> Self {
        self.join_clause = join_clause.into();
        self
    }

    pub fn assign(mut self, list: ListFilter) -> Self {
        self.list = Some(list);
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, mut params) = self.where_parts();
        let order_clause = match &self.list {
            Some(list) => FilterOrder::generate(&FilterOrder::for_sort(list.sort), &self.alias),
            None => String::new(),
        };
        let limit_clause = match &self.list {
            Some(list) => {
                params.push(SqlValue::BigInt(list.limit));
                params.push(SqlValue::BigInt(list.offset));
                format!("LIMIT ${} OFFSET ${}", params.len() - 1, params.len())
            }
            None => String::new(),
        };

        let query = [
            format!("SELECT {}", self.select_clause),
            format!("FROM \"{}\" {}", self.table_name, self.alias),
            self.join_clause.clone(),
            where_clause,
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = self.where_parts();
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\" {}", self.table_name, self.alias)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" {} {}", self.table_name, self.alias, where_clause)
        };
        SqlResult { query, params }
    }

    fn where_parts(&self) -> (String, Vec<SqlValue>) {
        match &self.list {
            Some(list) => {
                let (conditions, params) = FilterWhere::generate(list, &self.alias);
                if conditions.is_empty() {
                    (String::new(), params)
                } else {
                    (format!("WHERE {}", conditions), params)
                }
            }
            None => (String::new(), vec![]),
        }
    }

    fn validate_identifier(name: &str) -> Result<(), String> {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return Err(format!("Invalid identifier format: {:?}", name)),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("Invalid identifier format: {:?}", name));
        }
        Ok(())
    }
}
