use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{opt_text, push_present, ColumnSet};
use crate::filter::SqlValue;

/// Public profile; `id` is the identity provider's user id
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PUT /api/profiles/me body. Only these fields are editable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

impl ColumnSet for ProfileChanges {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut out = vec![];
        push_present(&mut out, "full_name", &self.full_name, |v| opt_text(&Some(v)));
        push_present(&mut out, "bio", &self.bio, |v| opt_text(&Some(v)));
        push_present(&mut out, "website", &self.website, |v| opt_text(&Some(v)));
        push_present(&mut out, "location", &self.location, |v| opt_text(&Some(v)));
        out
    }
}
