use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Comment, Content, Idea, NewResource, Profile, ProfileChanges, Project, Resource,
};
use crate::filter::ListFilter;

/// Result of a like or unlike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// A like row was added or removed and the counter moved with it
    Applied { likes_count: i32 },
    /// Nothing to do: already liked, or nothing to unlike
    Unchanged { likes_count: i32 },
    /// The project or idea does not exist
    Missing,
}

/// Persistence for one content kind (projects or ideas)
#[async_trait]
pub trait ContentStore<T: Content>: Send + Sync {
    /// One page of rows matching `filter`, plus the total match count
    async fn list(&self, filter: &ListFilter) -> Result<(Vec<T>, i64), DatabaseError>;

    /// Fetch a row and bump its view counter in the same statement.
    /// The returned row carries the incremented count.
    async fn find_and_count_view(&self, id: Uuid) -> Result<Option<T>, DatabaseError>;

    async fn author_of(&self, id: Uuid) -> Result<Option<Uuid>, DatabaseError>;

    async fn insert(&self, author_id: Uuid, draft: &T::Draft) -> Result<T, DatabaseError>;

    /// Apply present fields and stamp `updated_at`. `None` when the row is gone.
    async fn update(&self, id: Uuid, changes: &T::Changes) -> Result<Option<T>, DatabaseError>;

    /// Hard delete; likes and comments go with it. `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Which of `ids` the user has liked
    async fn liked_ids(&self, user_id: Uuid, ids: &[Uuid]) -> Result<HashSet<Uuid>, DatabaseError>;

    async fn like(&self, id: Uuid, user_id: Uuid) -> Result<LikeOutcome, DatabaseError>;

    async fn unlike(&self, id: Uuid, user_id: Uuid) -> Result<LikeOutcome, DatabaseError>;

    /// Comments oldest first
    async fn comments(&self, id: Uuid) -> Result<Vec<Comment>, DatabaseError>;

    /// Insert a comment and bump `comments_count`. `None` when the parent is gone.
    async fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>, DatabaseError>;
}

/// Projects and ideas written by one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthoredCounts {
    pub projects: i64,
    pub ideas: i64,
}

/// Everything the HTTP layer needs from persistence
#[async_trait]
pub trait Store: ContentStore<Project> + ContentStore<Idea> + Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Profile>, DatabaseError>;

    async fn set_avatar_url(&self, user_id: Uuid, url: &str) -> Result<Option<Profile>, DatabaseError>;

    /// Whether the resources table exists
    async fn resources_ready(&self) -> Result<bool, DatabaseError>;

    async fn insert_resource(
        &self,
        author_id: Uuid,
        draft: &NewResource,
    ) -> Result<Resource, DatabaseError>;

    /// Newest first
    async fn list_resources(&self) -> Result<Vec<Resource>, DatabaseError>;

    async fn authored_counts(&self, user_id: Uuid) -> Result<AuthoredCounts, DatabaseError>;
}
