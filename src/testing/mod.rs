//! In-process test harness: an in-memory [`Store`] and a router driven with
//! `tower::ServiceExt::oneshot`, authenticated with locally minted JWTs.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::types::Json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{AuthUser, JwtIdentity};
use crate::config::AppConfig;
use crate::database::models::{
    AuthorSummary, ColumnSet, Comment, Content, ContentMeta, Idea, NewResource, Profile,
    ProfileChanges, Project, Resource, DEFAULT_DIFFICULTY,
};
use crate::database::{AuthoredCounts, ContentStore, DatabaseError, LikeOutcome, Store};
use crate::filter::{FilterOrder, ListFilter, SortDirection, SqlValue};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "devibecoding-handler-tests";

pub struct Table<T> {
    rows: Vec<T>,
    /// (content id, user id)
    likes: HashSet<(Uuid, Uuid)>,
    comments: Vec<Comment>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: vec![],
            likes: HashSet::new(),
            comments: vec![],
        }
    }
}

/// Store backed by plain collections
pub struct MemoryStore {
    projects: RwLock<Table<Project>>,
    ideas: RwLock<Table<Idea>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
    resources: RwLock<Vec<Resource>>,
    available: AtomicBool,
    resources_ready: AtomicBool,
}

/// Rows are built and patched from the [`ColumnSet`] pairs the SQL store writes
pub trait MemoryContent: Content {
    fn table(store: &MemoryStore) -> &RwLock<Table<Self>>;

    /// A row with column defaults and zeroed counters
    fn blank(meta: ContentMeta) -> Self;

    /// Set a column that lives outside [`ContentMeta`]
    fn set_column(&mut self, column: &str, value: SqlValue);
}

impl MemoryContent for Project {
    fn table(store: &MemoryStore) -> &RwLock<Table<Self>> {
        &store.projects
    }

    fn blank(meta: ContentMeta) -> Self {
        Self {
            meta,
            image_url: None,
            technologies: vec![],
            github_url: None,
            demo_url: None,
        }
    }

    fn set_column(&mut self, column: &str, value: SqlValue) {
        match column {
            "image_url" => self.image_url = opt_text(value),
            "technologies" => self.technologies = text_array(value),
            "github_url" => self.github_url = opt_text(value),
            "demo_url" => self.demo_url = opt_text(value),
            other => panic!("unknown project column {}", other),
        }
    }
}

impl MemoryContent for Idea {
    fn table(store: &MemoryStore) -> &RwLock<Table<Self>> {
        &store.ideas
    }

    fn blank(meta: ContentMeta) -> Self {
        Self {
            meta,
            required_skills: vec![],
            implementation_count: 0,
            estimated_time: None,
        }
    }

    fn set_column(&mut self, column: &str, value: SqlValue) {
        match column {
            "required_skills" => self.required_skills = text_array(value),
            "estimated_time" => self.estimated_time = opt_text(value),
            other => panic!("unknown idea column {}", other),
        }
    }
}

fn opt_text(value: SqlValue) -> Option<String> {
    match value {
        SqlValue::Text(v) => Some(v),
        SqlValue::OptText(v) => v,
        other => panic!("expected text, got {:?}", other),
    }
}

fn text(value: SqlValue) -> String {
    opt_text(value).unwrap_or_default()
}

fn text_array(value: SqlValue) -> Vec<String> {
    match value {
        SqlValue::TextArray(v) => v,
        other => panic!("expected text[], got {:?}", other),
    }
}

fn blank_meta(id: Uuid, author_id: Uuid) -> ContentMeta {
    let now = Utc::now();
    ContentMeta {
        id,
        title: String::new(),
        description: String::new(),
        content: None,
        category: String::new(),
        difficulty_level: DEFAULT_DIFFICULTY.to_string(),
        tags: vec![],
        author_id,
        likes_count: 0,
        views_count: 0,
        comments_count: 0,
        created_at: now,
        updated_at: now,
        author: None,
        is_liked: None,
    }
}

fn apply_columns<T: MemoryContent>(row: &mut T, columns: Vec<(&'static str, SqlValue)>) {
    for (column, value) in columns {
        let meta = row.meta_mut();
        match column {
            "title" => meta.title = text(value),
            "description" => meta.description = text(value),
            "content" => meta.content = opt_text(value),
            "category" => meta.category = text(value),
            "difficulty_level" => meta.difficulty_level = text(value),
            "tags" => meta.tags = text_array(value),
            other => row.set_column(other, value),
        }
    }
}

fn apply_profile_columns(profile: &mut Profile, columns: Vec<(&'static str, SqlValue)>) {
    for (column, value) in columns {
        let value = opt_text(value);
        match column {
            "full_name" => profile.full_name = value,
            "bio" => profile.bio = value,
            "website" => profile.website = value,
            "location" => profile.location = value,
            other => panic!("unknown profile column {}", other),
        }
    }
}

/// `ILIKE '%needle%'` on title or description
fn matches_search(filter: &ListFilter, title: &str, description: &str) -> bool {
    match &filter.search {
        None => true,
        Some(needle) => {
            let needle = needle.to_lowercase();
            title.to_lowercase().contains(&needle) || description.to_lowercase().contains(&needle)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            projects: RwLock::default(),
            ideas: RwLock::default(),
            profiles: RwLock::default(),
            resources: RwLock::default(),
            available: AtomicBool::new(true),
            resources_ready: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a database outage: every call fails with a pool timeout
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_resources_ready(&self, ready: bool) {
        self.resources_ready.store(ready, Ordering::SeqCst);
    }

    pub fn insert_profile(&self, id: Uuid, username: &str) -> Profile {
        let now = Utc::now();
        let profile = Profile {
            id,
            username: Some(username.to_string()),
            full_name: Some(format!("{} (test)", username)),
            bio: None,
            website: None,
            location: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        self.profiles.write().unwrap().insert(id, profile.clone());
        profile
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::PoolTimedOut)
        }
    }

    fn author(&self, id: Uuid) -> Option<Json<AuthorSummary>> {
        self.profiles
            .read()
            .unwrap()
            .get(&id)
            .map(|profile| {
                Json(AuthorSummary {
                    id: profile.id,
                    full_name: profile.full_name.clone(),
                    username: profile.username.clone(),
                    avatar_url: profile.avatar_url.clone(),
                })
            })
    }

    fn with_author<T: Content>(&self, mut item: T) -> T {
        let author_id = item.meta().author_id;
        item.meta_mut().author = self.author(author_id);
        item
    }
}

fn matches_filter(filter: &ListFilter, meta: &ContentMeta) -> bool {
    filter.category.as_ref().map_or(true, |c| *c == meta.category)
        && filter.difficulty.as_ref().map_or(true, |d| *d == meta.difficulty_level)
        && matches_search(filter, &meta.title, &meta.description)
}

/// Same ordering the SQL listing uses
fn compare(filter: &ListFilter, a: &ContentMeta, b: &ContentMeta) -> CmpOrdering {
    FilterOrder::for_sort(filter.sort)
        .iter()
        .map(|order| {
            let ordering = match order.column {
                "likes_count" => a.likes_count.cmp(&b.likes_count),
                "comments_count" => a.comments_count.cmp(&b.comments_count),
                "views_count" => a.views_count.cmp(&b.views_count),
                _ => a.created_at.cmp(&b.created_at),
            };
            match order.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| *ordering != CmpOrdering::Equal)
        .unwrap_or(CmpOrdering::Equal)
}

#[async_trait]
impl<T: MemoryContent> ContentStore<T> for MemoryStore {
    async fn list(&self, filter: &ListFilter) -> Result<(Vec<T>, i64), DatabaseError> {
        self.check()?;
        let mut rows: Vec<T> = T::table(self)
            .read()
            .unwrap()
            .rows
            .iter()
            .filter(|row| matches_filter(filter, row.meta()))
            .cloned()
            .collect();
        let total = rows.len() as i64;
        rows.sort_by(|a, b| compare(filter, a.meta(), b.meta()));

        let page = rows
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .map(|row| self.with_author(row))
            .collect();
        Ok((page, total))
    }

    async fn find_and_count_view(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.check()?;
        let found = {
            let mut table = T::table(self).write().unwrap();
            table.rows.iter_mut().find(|row| row.meta().id == id).map(|row| {
                row.meta_mut().views_count += 1;
                row.clone()
            })
        };
        Ok(found.map(|row| self.with_author(row)))
    }

    async fn author_of(&self, id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        self.check()?;
        let table = T::table(self).read().unwrap();
        Ok(table
            .rows
            .iter()
            .find(|row| row.meta().id == id)
            .map(|row| row.meta().author_id))
    }

    async fn insert(&self, author_id: Uuid, draft: &T::Draft) -> Result<T, DatabaseError> {
        self.check()?;
        let mut row = T::blank(blank_meta(Uuid::new_v4(), author_id));
        apply_columns(&mut row, draft.columns());
        T::table(self).write().unwrap().rows.push(row.clone());
        Ok(self.with_author(row))
    }

    async fn update(&self, id: Uuid, changes: &T::Changes) -> Result<Option<T>, DatabaseError> {
        self.check()?;
        let updated = {
            let mut table = T::table(self).write().unwrap();
            table.rows.iter_mut().find(|row| row.meta().id == id).map(|row| {
                apply_columns(row, changes.columns());
                row.meta_mut().updated_at = Utc::now();
                row.clone()
            })
        };
        Ok(updated.map(|row| self.with_author(row)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.check()?;
        let mut table = T::table(self).write().unwrap();
        let before = table.rows.len();
        table.rows.retain(|row| row.meta().id != id);
        table.likes.retain(|(parent, _)| *parent != id);
        table.comments.retain(|comment| comment.parent_id != id);
        Ok(table.rows.len() < before)
    }

    async fn liked_ids(&self, user_id: Uuid, ids: &[Uuid]) -> Result<HashSet<Uuid>, DatabaseError> {
        self.check()?;
        let table = T::table(self).read().unwrap();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| table.likes.contains(&(*id, user_id)))
            .collect())
    }

    async fn like(&self, id: Uuid, user_id: Uuid) -> Result<LikeOutcome, DatabaseError> {
        self.check()?;
        let mut guard = T::table(self).write().unwrap();
        let table = &mut *guard;
        let Some(row) = table.rows.iter_mut().find(|row| row.meta().id == id) else {
            return Ok(LikeOutcome::Missing);
        };
        let meta = row.meta_mut();
        if table.likes.insert((id, user_id)) {
            meta.likes_count += 1;
            Ok(LikeOutcome::Applied { likes_count: meta.likes_count })
        } else {
            Ok(LikeOutcome::Unchanged { likes_count: meta.likes_count })
        }
    }

    async fn unlike(&self, id: Uuid, user_id: Uuid) -> Result<LikeOutcome, DatabaseError> {
        self.check()?;
        let mut guard = T::table(self).write().unwrap();
        let table = &mut *guard;
        let Some(row) = table.rows.iter_mut().find(|row| row.meta().id == id) else {
            return Ok(LikeOutcome::Missing);
        };
        let meta = row.meta_mut();
        if table.likes.remove(&(id, user_id)) {
            meta.likes_count = (meta.likes_count - 1).max(0);
            Ok(LikeOutcome::Applied { likes_count: meta.likes_count })
        } else {
            Ok(LikeOutcome::Unchanged { likes_count: meta.likes_count })
        }
    }

    async fn comments(&self, id: Uuid) -> Result<Vec<Comment>, DatabaseError> {
        self.check()?;
        let comments: Vec<Comment> = T::table(self)
            .read()
            .unwrap()
            .comments
            .iter()
            .filter(|comment| comment.parent_id == id)
            .cloned()
            .collect();
        Ok(comments
            .into_iter()
            .map(|mut comment| {
                comment.author = self.author(comment.author_id);
                comment
            })
            .collect())
    }

    async fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>, DatabaseError> {
        self.check()?;
        let comment = {
            let mut guard = T::table(self).write().unwrap();
            let table = &mut *guard;
            let Some(row) = table.rows.iter_mut().find(|row| row.meta().id == id) else {
                return Ok(None);
            };
            row.meta_mut().comments_count += 1;
            let comment = Comment {
                id: Uuid::new_v4(),
                parent_id: id,
                author_id,
                content: content.to_string(),
                created_at: Utc::now(),
                author: None,
            };
            table.comments.push(comment.clone());
            comment
        };
        Ok(Some(Comment {
            author: self.author(author_id),
            ..comment
        }))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check()
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        self.check()?;
        Ok(self.profiles.read().unwrap().get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Profile>, DatabaseError> {
        self.check()?;
        let mut profiles = self.profiles.write().unwrap();
        Ok(profiles.get_mut(&user_id).map(|profile| {
            apply_profile_columns(profile, changes.columns());
            profile.updated_at = Utc::now();
            profile.clone()
        }))
    }

    async fn set_avatar_url(&self, user_id: Uuid, url: &str) -> Result<Option<Profile>, DatabaseError> {
        self.check()?;
        let mut profiles = self.profiles.write().unwrap();
        Ok(profiles.get_mut(&user_id).map(|profile| {
            profile.avatar_url = Some(url.to_string());
            profile.updated_at = Utc::now();
            profile.clone()
        }))
    }

    async fn resources_ready(&self) -> Result<bool, DatabaseError> {
        self.check()?;
        Ok(self.resources_ready.load(Ordering::SeqCst))
    }

    async fn insert_resource(
        &self,
        author_id: Uuid,
        draft: &NewResource,
    ) -> Result<Resource, DatabaseError> {
        self.check()?;
        let now = Utc::now();
        let resource = Resource {
            id: Uuid::new_v4(),
            title: draft.title.clone().unwrap_or_default(),
            description: draft.description.clone().unwrap_or_default(),
            url: draft.url.clone().unwrap_or_default(),
            kind: draft.kind.clone().unwrap_or_default(),
            tags: draft.tags.clone().unwrap_or_default(),
            author_id,
            created_at: now,
            updated_at: now,
        };
        self.resources.write().unwrap().push(resource.clone());
        Ok(resource)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, DatabaseError> {
        self.check()?;
        // newest insert first among equal timestamps
        let mut resources: Vec<Resource> =
            self.resources.read().unwrap().iter().rev().cloned().collect();
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resources)
    }

    async fn authored_counts(&self, user_id: Uuid) -> Result<AuthoredCounts, DatabaseError> {
        self.check()?;
        let projects = self.projects.read().unwrap().rows.iter().filter(|r| r.meta.author_id == user_id).count();
        let ideas = self.ideas.read().unwrap().rows.iter().filter(|r| r.meta.author_id == user_id).count();
        Ok(AuthoredCounts { projects: projects as i64, ideas: ideas as i64 })
    }
}

/// The real router over a [`MemoryStore`], with its own upload directory
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    identity: JwtIdentity,
    upload_dir: PathBuf,
    avatar_max_bytes: usize,
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = std::env::temp_dir().join(format!("devibecoding-test-{}", Uuid::new_v4()));
        let avatar_max_bytes = 16 * 1024;

        let mut config = AppConfig::development();
        config.auth.jwt_secret = Some(TEST_JWT_SECRET.to_string());
        config.uploads.dir = upload_dir.clone();
        config.uploads.avatar_max_bytes = avatar_max_bytes;

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            config,
            store.clone(),
            Arc::new(JwtIdentity::new(TEST_JWT_SECRET)),
        );

        Self {
            router: crate::app(state),
            store,
            identity: JwtIdentity::new(TEST_JWT_SECRET),
            upload_dir,
            avatar_max_bytes,
        }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        let user = AuthUser {
            id: user_id,
            email: Some(format!("{}@devibecoding.test", user_id.simple())),
            role: "user".to_string(),
        };
        self.identity
            .issue(&user, chrono::Duration::hours(1))
            .expect("mint test token")
    }

    /// A user with a profile row, plus a token for them
    pub async fn user_with_profile(&self, username: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        self.store.insert_profile(id, username);
        (id, self.token_for(id))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");
        self.send(request).await
    }

    /// Send a JSON body verbatim, e.g. a malformed one
    pub async fn raw_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        raw: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(raw.to_string())).expect("build request"))
            .await
    }

    pub async fn upload_avatar(
        &self,
        token: &str,
        field: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let boundary = "devibecoding-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/profiles/me/avatar")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .expect("build request");
        self.send(request).await
    }

    /// Where a `/uploads/...` URL lives on disk
    pub fn upload_path(&self, url: &str) -> PathBuf {
        self.upload_dir.join(url.trim_start_matches("/uploads/"))
    }

    pub fn stored_avatar_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir.join("avatars"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn avatar_max_bytes(&self) -> usize {
        self.avatar_max_bytes
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}
