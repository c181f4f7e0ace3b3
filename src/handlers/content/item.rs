use axum::extract::{Path, State};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::database::models::Content;
use crate::database::{ContentStore, Store};
use crate::error::message_body;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, OptionalUser};
use crate::services::content_service::{self, parse_id};
use crate::state::AppState;

/// GET /api/{projects,ideas}/:id - counts a view
pub async fn get<T>(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(id): Path<String>,
) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let id = parse_id::<T>(&id)?;
    let item = content_service::get::<T, dyn Store>(&*state.store, id, viewer.as_ref()).await?;
    Ok(ApiResponse::success(content_service::item_body(&item)?))
}

/// PUT /api/{projects,ideas}/:id - author only
pub async fn put<T>(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<T::Changes>,
) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let id = parse_id::<T>(&id)?;
    let item = content_service::update::<T, dyn Store>(&*state.store, &user, id, &changes).await?;
    Ok(ApiResponse::success(content_service::item_body(&item)?))
}

/// DELETE /api/{projects,ideas}/:id - author only
pub async fn delete<T>(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let id = parse_id::<T>(&id)?;
    content_service::delete::<T, dyn Store>(&*state.store, &user, id).await?;
    Ok(ApiResponse::success(message_body(T::KIND.deleted())))
}
