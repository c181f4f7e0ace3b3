//! Operations shared by projects and ideas.
//!
//! Every function is generic over the content type and takes the store as a
//! trait object, so the same code path serves `/api/projects` and `/api/ideas`
//! against Postgres or the in-memory test store.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{Comment, Content, NewContent};
use crate::database::{ContentStore, LikeOutcome};
use crate::error::ApiError;
use crate::filter::{ListFilter, Pagination};

pub const LIKE_ADDED: &str = "Like agregado correctamente";
pub const LIKE_REMOVED: &str = "Like removido correctamente";
pub const COMMENT_REQUIRED: &str = "El contenido del comentario es requerido";
pub const COMMENTS_FAILED: &str = "Error al obtener los comentarios";
pub const COMMENT_FAILED: &str = "Error al crear el comentario";

/// Parse a path id; anything that is not a UUID cannot name an existing row
pub fn parse_id<T: Content>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(T::KIND.not_found()))
}

/// One page of a listing plus its pagination block
pub async fn list<T, S>(
    store: &S,
    filter: &ListFilter,
    viewer: Option<&AuthUser>,
) -> Result<(Vec<T>, Pagination), ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let kind = T::KIND;
    let (mut items, total) = store
        .list(filter)
        .await
        .map_err(ApiError::store(kind.list_failed()))?;

    if let Some(viewer) = viewer {
        mark_liked(store, viewer, &mut items)
            .await
            .map_err(ApiError::store(kind.list_failed()))?;
    }

    Ok((items, filter.pagination(total)))
}

/// `{ "<plural>": [...], "pagination": {..., "total<Kind>": n} }`
pub fn list_body<T: Content>(items: &[T], pagination: &Pagination) -> Result<Value, ApiError> {
    let kind = T::KIND;
    let mut pagination_value = serde_json::to_value(pagination).map_err(serialize_failed)?;
    if let Value::Object(map) = &mut pagination_value {
        map.insert(kind.total_key().to_string(), Value::from(pagination.total_count));
    }

    let mut body = Map::new();
    body.insert(
        kind.plural().to_string(),
        serde_json::to_value(items).map_err(serialize_failed)?,
    );
    body.insert("pagination".to_string(), pagination_value);
    Ok(Value::Object(body))
}

/// `{ "<singular>": item }`
pub fn item_body<T: Content>(item: &T) -> Result<Value, ApiError> {
    let mut body = Map::new();
    body.insert(
        T::KIND.singular().to_string(),
        serde_json::to_value(item).map_err(serialize_failed)?,
    );
    Ok(Value::Object(body))
}

/// A comment as the client sees it: the parent id is keyed `project_id` or `idea_id`
pub fn comment_value<T: Content>(comment: &Comment) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(comment).map_err(serialize_failed)?;
    if let Value::Object(map) = &mut value {
        if let Some(parent) = map.remove("parent_id") {
            map.insert(T::KIND.parent_column().to_string(), parent);
        }
    }
    Ok(value)
}

fn serialize_failed(err: serde_json::Error) -> ApiError {
    tracing::error!("Failed to serialize response data: {}", err);
    ApiError::internal(crate::error::INTERNAL_ERROR)
}

async fn mark_liked<T, S>(
    store: &S,
    viewer: &AuthUser,
    items: &mut [T],
) -> Result<(), crate::database::DatabaseError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let ids: Vec<Uuid> = items.iter().map(|item| item.meta().id).collect();
    let liked = store.liked_ids(viewer.id, &ids).await?;
    for item in items.iter_mut() {
        let id = item.meta().id;
        item.meta_mut().is_liked = Some(liked.contains(&id));
    }
    Ok(())
}

/// Fetch one row, counting the view
pub async fn get<T, S>(store: &S, id: Uuid, viewer: Option<&AuthUser>) -> Result<T, ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let kind = T::KIND;
    let mut item = store
        .find_and_count_view(id)
        .await
        .map_err(ApiError::store(crate::error::INTERNAL_ERROR))?
        .ok_or_else(|| ApiError::not_found(kind.not_found()))?;

    if let Some(viewer) = viewer {
        mark_liked(store, viewer, std::slice::from_mut(&mut item))
            .await
            .map_err(ApiError::store(crate::error::INTERNAL_ERROR))?;
    }

    Ok(item)
}

pub async fn create<T, S>(store: &S, author: &AuthUser, draft: &T::Draft) -> Result<T, ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    if let Some(message) = draft.missing_fields() {
        return Err(ApiError::bad_request(message));
    }

    let item = store
        .insert(author.id, draft)
        .await
        .map_err(ApiError::store_with_details(T::KIND.create_failed()))?;

    tracing::info!(id = %item.meta().id, author = %author.id, "Created {}", T::KIND.singular());
    Ok(item)
}

/// 404 when the row is gone, 403 when the caller did not write it
async fn ensure_author<T, S>(
    store: &S,
    user: &AuthUser,
    id: Uuid,
    denied: &'static str,
) -> Result<(), ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let author_id = store
        .author_of(id)
        .await
        .map_err(ApiError::store(crate::error::INTERNAL_ERROR))?
        .ok_or_else(|| ApiError::not_found(T::KIND.not_found()))?;

    if author_id != user.id {
        tracing::warn!(%id, user = %user.id, "Refused change by non-author");
        return Err(ApiError::forbidden(denied));
    }
    Ok(())
}

pub async fn update<T, S>(
    store: &S,
    user: &AuthUser,
    id: Uuid,
    changes: &T::Changes,
) -> Result<T, ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let kind = T::KIND;
    ensure_author::<T, S>(store, user, id, kind.cannot_edit()).await?;

    store
        .update(id, changes)
        .await
        .map_err(ApiError::store(kind.update_failed()))?
        .ok_or_else(|| ApiError::not_found(kind.not_found()))
}

pub async fn delete<T, S>(store: &S, user: &AuthUser, id: Uuid) -> Result<(), ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let kind = T::KIND;
    ensure_author::<T, S>(store, user, id, kind.cannot_delete()).await?;

    let deleted = store
        .delete(id)
        .await
        .map_err(ApiError::store(kind.delete_failed()))?;
    if !deleted {
        return Err(ApiError::not_found(kind.not_found()));
    }

    tracing::info!(%id, user = %user.id, "Deleted {}", kind.singular());
    Ok(())
}

/// Add the caller's like; returns the new counter
pub async fn like<T, S>(store: &S, user: &AuthUser, id: Uuid) -> Result<i32, ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let kind = T::KIND;
    match store
        .like(id, user.id)
        .await
        .map_err(ApiError::store(kind.like_failed()))?
    {
        LikeOutcome::Applied { likes_count } => Ok(likes_count),
        LikeOutcome::Unchanged { .. } => Err(ApiError::bad_request(kind.already_liked())),
        LikeOutcome::Missing => Err(ApiError::not_found(kind.not_found())),
    }
}

/// Remove the caller's like, if any; returns the counter
pub async fn unlike<T, S>(store: &S, user: &AuthUser, id: Uuid) -> Result<i32, ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let kind = T::KIND;
    match store
        .unlike(id, user.id)
        .await
        .map_err(ApiError::store(kind.unlike_failed()))?
    {
        LikeOutcome::Applied { likes_count } | LikeOutcome::Unchanged { likes_count } => Ok(likes_count),
        LikeOutcome::Missing => Err(ApiError::not_found(kind.not_found())),
    }
}

pub async fn comments<T, S>(store: &S, id: Uuid) -> Result<Vec<Comment>, ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    store.comments(id).await.map_err(ApiError::store(COMMENTS_FAILED))
}

pub async fn add_comment<T, S>(
    store: &S,
    user: &AuthUser,
    id: Uuid,
    content: Option<&str>,
) -> Result<Comment, ApiError>
where
    T: Content,
    S: ContentStore<T> + ?Sized,
{
    let content = content
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request(COMMENT_REQUIRED))?;

    store
        .add_comment(id, user.id, content)
        .await
        .map_err(ApiError::store(COMMENT_FAILED))?
        .ok_or_else(|| ApiError::not_found(T::KIND.not_found()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::database::models::Idea;

    #[test]
    fn comment_parent_is_keyed_by_kind() {
        let parent = Uuid::new_v4();
        let comment = Comment {
            id: Uuid::new_v4(),
            parent_id: parent,
            author_id: Uuid::new_v4(),
            content: "hola".into(),
            created_at: Utc::now(),
            author: None,
        };

        let value = comment_value::<Idea>(&comment).unwrap();
        assert_eq!(value["idea_id"], json!(parent));
        assert!(value.get("parent_id").is_none());
        assert_eq!(value["content"], "hola");
    }
}
