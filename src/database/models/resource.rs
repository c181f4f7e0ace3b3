use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use super::{is_blank, ColumnSet};
use crate::filter::SqlValue;

/// A user-submitted link: tutorial, video, code, article
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// POST /api/resources body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewResource {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NewResource {
    pub fn is_complete(&self) -> bool {
        !is_blank(&self.title)
            && !is_blank(&self.description)
            && !is_blank(&self.url)
            && !is_blank(&self.kind)
            && self.tag_count() > 0
    }

    pub fn tag_count(&self) -> usize {
        self.tags.as_ref().map_or(0, Vec::len)
    }

    /// Which fields arrived, echoed back on validation failures
    pub fn received(&self) -> Value {
        json!({
            "title": !is_blank(&self.title),
            "description": !is_blank(&self.description),
            "url": !is_blank(&self.url),
            "type": !is_blank(&self.kind),
            "tags": self.tag_count(),
        })
    }
}

impl ColumnSet for NewResource {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("title", SqlValue::Text(self.title.clone().unwrap_or_default())),
            ("description", SqlValue::Text(self.description.clone().unwrap_or_default())),
            ("url", SqlValue::Text(self.url.clone().unwrap_or_default())),
            ("type", SqlValue::Text(self.kind.clone().unwrap_or_default())),
            ("tags", SqlValue::TextArray(self.tags.clone().unwrap_or_default())),
        ]
    }
}
