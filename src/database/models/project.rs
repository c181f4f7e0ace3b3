use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{
    is_blank, opt_text, push_present, ColumnSet, Content, ContentKind, ContentMeta, NewContent,
    DEFAULT_DIFFICULTY,
};
use crate::filter::SqlValue;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub meta: ContentMeta,
    pub image_url: Option<String>,
    pub technologies: Vec<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
}

/// POST /api/projects body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// PUT /api/projects/:id body; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NewProject {
    fn technologies(&self) -> Vec<String> {
        self.technologies.clone().unwrap_or_default()
    }

    fn difficulty(&self) -> String {
        self.difficulty_level
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string())
    }
}

impl NewContent for NewProject {
    fn missing_fields(&self) -> Option<&'static str> {
        if is_blank(&self.title) || is_blank(&self.description) || is_blank(&self.category) {
            return Some("Título, descripción y categoría son requeridos");
        }
        if self.technologies.as_ref().map_or(true, |t| t.is_empty()) {
            return Some("Al menos una tecnología es requerida");
        }
        None
    }
}

impl ColumnSet for NewProject {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("title", SqlValue::Text(self.title.clone().unwrap_or_default())),
            ("description", SqlValue::Text(self.description.clone().unwrap_or_default())),
            ("content", opt_text(&self.content)),
            ("image_url", opt_text(&self.image_url)),
            ("technologies", SqlValue::TextArray(self.technologies())),
            ("github_url", opt_text(&self.github_url)),
            ("demo_url", opt_text(&self.demo_url)),
            ("category", SqlValue::Text(self.category.clone().unwrap_or_default())),
            ("difficulty_level", SqlValue::Text(self.difficulty())),
            ("tags", SqlValue::TextArray(self.tags.clone().unwrap_or_default())),
        ]
    }
}

impl ColumnSet for ProjectChanges {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut out = vec![];
        push_present(&mut out, "title", &self.title, SqlValue::Text);
        push_present(&mut out, "description", &self.description, SqlValue::Text);
        push_present(&mut out, "content", &self.content, |v| opt_text(&Some(v)));
        push_present(&mut out, "image_url", &self.image_url, |v| opt_text(&Some(v)));
        push_present(&mut out, "technologies", &self.technologies, SqlValue::TextArray);
        push_present(&mut out, "github_url", &self.github_url, |v| opt_text(&Some(v)));
        push_present(&mut out, "demo_url", &self.demo_url, |v| opt_text(&Some(v)));
        push_present(&mut out, "category", &self.category, SqlValue::Text);
        push_present(&mut out, "difficulty_level", &self.difficulty_level, SqlValue::Text);
        push_present(&mut out, "tags", &self.tags, SqlValue::TextArray);
        out
    }
}

impl Content for Project {
    type Draft = NewProject;
    type Changes = ProjectChanges;

    const KIND: ContentKind = ContentKind::Project;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(value: serde_json::Value) -> NewProject {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn requires_title_description_category() {
        let d = draft(json!({ "title": "X", "description": "  ", "category": "web", "technologies": ["React"] }));
        assert_eq!(d.missing_fields(), Some("Título, descripción y categoría son requeridos"));
    }

    #[test]
    fn requires_a_technology() {
        let d = draft(json!({ "title": "X", "description": "Y", "category": "web", "technologies": [] }));
        assert_eq!(d.missing_fields(), Some("Al menos una tecnología es requerida"));

        let d = draft(json!({ "title": "X", "description": "Y", "category": "web" }));
        assert_eq!(d.missing_fields(), Some("Al menos una tecnología es requerida"));
    }

    #[test]
    fn insert_columns_apply_defaults() {
        let d = draft(json!({ "title": "X", "description": "Y", "category": "web", "technologies": ["React"], "github_url": "" }));
        assert_eq!(d.missing_fields(), None);
        let cols = d.columns();
        assert!(cols.contains(&("difficulty_level", SqlValue::Text("beginner".into()))));
        assert!(cols.contains(&("tags", SqlValue::TextArray(vec![]))));
        assert!(cols.contains(&("github_url", SqlValue::OptText(None))));
    }

    #[test]
    fn changes_only_carry_present_fields() {
        let changes: ProjectChanges = serde_json::from_value(json!({ "title": "Nuevo", "tags": ["a"] })).unwrap();
        let cols = changes.columns();
        assert_eq!(
            cols,
            vec![
                ("title", SqlValue::Text("Nuevo".into())),
                ("tags", SqlValue::TextArray(vec!["a".into()])),
            ]
        );
    }
}
