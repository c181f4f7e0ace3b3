use super::types::{FilterOrderInfo, SortDirection, SortKey};

pub struct FilterOrder;

impl FilterOrder {
    pub fn for_sort(sort: SortKey) -> Vec<FilterOrderInfo> {
        let desc = |column| FilterOrderInfo { column, sort: SortDirection::Desc };
        match sort {
            SortKey::Popularity => vec![desc("likes_count"), desc("comments_count"), desc("created_at")],
            SortKey::Likes => vec![desc("likes_count")],
            SortKey::Comments => vec![desc("comments_count")],
            SortKey::Views => vec![desc("views_count")],
            SortKey::Newest => vec![desc("created_at")],
        }
    }

    pub fn generate(infos: &[FilterOrderInfo], alias: &str) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{}.\"{}\" {}", alias, i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
