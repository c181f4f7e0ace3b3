use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{
    is_blank, opt_text, push_present, ColumnSet, Content, ContentKind, ContentMeta, NewContent,
    DEFAULT_DIFFICULTY,
};
use crate::filter::SqlValue;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Idea {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub meta: ContentMeta,
    pub required_skills: Vec<String>,
    pub implementation_count: i32,
    pub estimated_time: Option<String>,
}

/// POST /api/ideas body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIdea {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub required_skills: Option<Vec<String>>,
    pub difficulty_level: Option<String>,
    pub estimated_time: Option<String>,
}

/// PUT /api/ideas/:id body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub required_skills: Option<Vec<String>>,
    pub difficulty_level: Option<String>,
    pub estimated_time: Option<String>,
}

impl NewIdea {
    fn difficulty(&self) -> String {
        self.difficulty_level
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string())
    }
}

impl NewContent for NewIdea {
    fn missing_fields(&self) -> Option<&'static str> {
        if is_blank(&self.title) || is_blank(&self.description) || is_blank(&self.category) {
            return Some("Título, descripción y categoría son requeridos");
        }
        None
    }
}

impl ColumnSet for NewIdea {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("title", SqlValue::Text(self.title.clone().unwrap_or_default())),
            ("description", SqlValue::Text(self.description.clone().unwrap_or_default())),
            ("content", opt_text(&self.content)),
            ("category", SqlValue::Text(self.category.clone().unwrap_or_default())),
            ("tags", SqlValue::TextArray(self.tags.clone().unwrap_or_default())),
            ("required_skills", SqlValue::TextArray(self.required_skills.clone().unwrap_or_default())),
            ("difficulty_level", SqlValue::Text(self.difficulty())),
            ("estimated_time", opt_text(&self.estimated_time)),
        ]
    }
}

impl ColumnSet for IdeaChanges {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut out = vec![];
        push_present(&mut out, "title", &self.title, SqlValue::Text);
        push_present(&mut out, "description", &self.description, SqlValue::Text);
        push_present(&mut out, "content", &self.content, |v| opt_text(&Some(v)));
        push_present(&mut out, "category", &self.category, SqlValue::Text);
        push_present(&mut out, "tags", &self.tags, SqlValue::TextArray);
        push_present(&mut out, "required_skills", &self.required_skills, SqlValue::TextArray);
        push_present(&mut out, "difficulty_level", &self.difficulty_level, SqlValue::Text);
        push_present(&mut out, "estimated_time", &self.estimated_time, |v| opt_text(&Some(v)));
        out
    }
}

impl Content for Idea {
    type Draft = NewIdea;
    type Changes = IdeaChanges;

    const KIND: ContentKind = ContentKind::Idea;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }
}
