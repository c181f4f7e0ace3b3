use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOrderInfo {
    pub column: &'static str,
    pub sort: SortDirection,
}

/// Orderings a listing can ask for with `?sort=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// likes, then comments, then newest first
    #[default]
    Popularity,
    Likes,
    Comments,
    Views,
    Newest,
}

impl SortKey {
    /// Unknown keys fall back to newest first
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "popularity" => SortKey::Popularity,
            "likes" | "likes_count" => SortKey::Likes,
            "comments" | "comments_count" => SortKey::Comments,
            "views" | "views_count" => SortKey::Views,
            _ => SortKey::Newest,
        }
    }
}

/// A positional SQL parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    OptText(Option<String>),
    TextArray(Vec<String>),
    BigInt(i64),
    Uuid(Uuid),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}
