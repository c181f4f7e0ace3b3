use super::filter::ListFilter;
use super::types::SqlValue;

/// Builds the WHERE conditions of a listing with `$n` placeholders
pub struct FilterWhere {
    param_values: Vec<SqlValue>,
    conditions: Vec<String>,
}

impl FilterWhere {
    fn new() -> Self {
        Self {
            param_values: vec![],
            conditions: vec![],
        }
    }

    /// Conditions joined with AND (empty when nothing filters) and their parameters
    pub fn generate(list: &ListFilter, alias: &str) -> (String, Vec<SqlValue>) {
        let mut filter_where = Self::new();
        filter_where.build(list, alias);
        (filter_where.conditions.join(" AND "), filter_where.param_values)
    }

    fn build(&mut self, list: &ListFilter, alias: &str) {
        if let Some(category) = &list.category {
            let p = self.param(SqlValue::Text(category.clone()));
            self.conditions.push(format!("{}.\"category\" = {}", alias, p));
        }
        if let Some(difficulty) = &list.difficulty {
            let p = self.param(SqlValue::Text(difficulty.clone()));
            self.conditions.push(format!("{}.\"difficulty_level\" = {}", alias, p));
        }
        if let Some(search) = &list.search {
            let p = self.param(SqlValue::Text(format!("%{}%", escape_like(search))));
            self.conditions.push(format!(
                "({alias}.\"title\" ILIKE {p} OR {alias}.\"description\" ILIKE {p})"
            ));
        }
    }

    fn param(&mut self, value: SqlValue) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

/// Escape LIKE wildcards so user input matches literally (backslash is the default escape)
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
