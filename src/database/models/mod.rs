pub mod comment;
pub mod idea;
pub mod profile;
pub mod project;
pub mod resource;

pub use comment::Comment;
pub use idea::{Idea, IdeaChanges, NewIdea};
pub use profile::{Profile, ProfileChanges};
pub use project::{NewProject, Project, ProjectChanges};
pub use resource::{NewResource, Resource};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::filter::SqlValue;

pub const DEFAULT_DIFFICULTY: &str = "beginner";

/// Author as embedded in projects, ideas and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Columns shared by projects and ideas
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ContentMeta {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub category: String,
    pub difficulty_level: String,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub likes_count: i32,
    pub views_count: i32,
    pub comments_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Option<Json<AuthorSummary>>,
    /// Only set when the caller is authenticated
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

/// The two likeable, commentable content types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Project,
    Idea,
}

impl ContentKind {
    pub fn table(self) -> &'static str {
        match self {
            ContentKind::Project => "projects",
            ContentKind::Idea => "ideas",
        }
    }

    pub fn likes_table(self) -> &'static str {
        match self {
            ContentKind::Project => "project_likes",
            ContentKind::Idea => "idea_likes",
        }
    }

    pub fn comments_table(self) -> &'static str {
        match self {
            ContentKind::Project => "project_comments",
            ContentKind::Idea => "idea_comments",
        }
    }

    /// Foreign key column in the like and comment tables
    pub fn parent_column(self) -> &'static str {
        match self {
            ContentKind::Project => "project_id",
            ContentKind::Idea => "idea_id",
        }
    }

    /// Key of the list in listing responses
    pub fn plural(self) -> &'static str {
        self.table()
    }

    /// Key of the item in single-item responses
    pub fn singular(self) -> &'static str {
        match self {
            ContentKind::Project => "project",
            ContentKind::Idea => "idea",
        }
    }

    /// Pagination key carrying the total, e.g. `totalProjects`
    pub fn total_key(self) -> &'static str {
        match self {
            ContentKind::Project => "totalProjects",
            ContentKind::Idea => "totalIdeas",
        }
    }

    pub fn default_page_size(self) -> i64 {
        match self {
            ContentKind::Project => 30,
            ContentKind::Idea => 20,
        }
    }

    pub fn not_found(self) -> &'static str {
        match self {
            ContentKind::Project => "Proyecto no encontrado",
            ContentKind::Idea => "Idea no encontrada",
        }
    }

    pub fn cannot_edit(self) -> &'static str {
        match self {
            ContentKind::Project => "No tienes permisos para editar este proyecto",
            ContentKind::Idea => "No tienes permisos para editar esta idea",
        }
    }

    pub fn cannot_delete(self) -> &'static str {
        match self {
            ContentKind::Project => "No tienes permisos para eliminar este proyecto",
            ContentKind::Idea => "No tienes permisos para eliminar esta idea",
        }
    }

    pub fn deleted(self) -> &'static str {
        match self {
            ContentKind::Project => "Proyecto eliminado correctamente",
            ContentKind::Idea => "Idea eliminada correctamente",
        }
    }

    pub fn already_liked(self) -> &'static str {
        match self {
            ContentKind::Project => "Ya le diste like a este proyecto",
            ContentKind::Idea => "Ya le diste like a esta idea",
        }
    }

    pub fn list_failed(self) -> &'static str {
        match self {
            ContentKind::Project => "Error al obtener los proyectos",
            ContentKind::Idea => "Error al obtener las ideas",
        }
    }

    pub fn create_failed(self) -> &'static str {
        match self {
            ContentKind::Project => "Error al crear el proyecto",
            ContentKind::Idea => "Error al crear la idea",
        }
    }

    pub fn update_failed(self) -> &'static str {
        match self {
            ContentKind::Project => "Error al actualizar el proyecto",
            ContentKind::Idea => "Error al actualizar la idea",
        }
    }

    pub fn delete_failed(self) -> &'static str {
        match self {
            ContentKind::Project => "Error al eliminar el proyecto",
            ContentKind::Idea => "Error al eliminar la idea",
        }
    }

    pub fn like_failed(self) -> &'static str {
        match self {
            ContentKind::Project => "Error al dar like al proyecto",
            ContentKind::Idea => "Error al dar like a la idea",
        }
    }

    pub fn unlike_failed(self) -> &'static str {
        match self {
            ContentKind::Project => "Error al quitar like del proyecto",
            ContentKind::Idea => "Error al quitar like de la idea",
        }
    }
}

/// Column/value pairs written by an insert or update
pub trait ColumnSet {
    fn columns(&self) -> Vec<(&'static str, SqlValue)>;
}

/// Body of a create request
pub trait NewContent: ColumnSet + DeserializeOwned + Send + Sync {
    /// Message describing the first missing required field, if any
    fn missing_fields(&self) -> Option<&'static str>;
}

/// A project or an idea
pub trait Content:
    Serialize + Clone + Send + Sync + Unpin + 'static + for<'r> FromRow<'r, PgRow>
{
    type Draft: NewContent;
    type Changes: ColumnSet + DeserializeOwned + Send + Sync;

    const KIND: ContentKind;

    fn meta(&self) -> &ContentMeta;
    fn meta_mut(&mut self) -> &mut ContentMeta;
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

pub(crate) fn opt_text(value: &Option<String>) -> SqlValue {
    SqlValue::OptText(value.as_deref().filter(|v| !v.is_empty()).map(str::to_string))
}

/// Push `(column, value)` when the field was present in the request
pub(crate) fn push_present<T: Clone>(
    out: &mut Vec<(&'static str, SqlValue)>,
    column: &'static str,
    value: &Option<T>,
    wrap: impl FnOnce(T) -> SqlValue,
) {
    if let Some(v) = value {
        out.push((column, wrap(v.clone())));
    }
}
