use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::database::models::Content;
use crate::database::{ContentStore, Store};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::content_service::{self, parse_id, LIKE_ADDED, LIKE_REMOVED};
use crate::state::AppState;

/// POST /api/{projects,ideas}/:id/like
pub async fn post<T>(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let id = parse_id::<T>(&id)?;
    let likes_count = content_service::like::<T, dyn Store>(&*state.store, &user, id).await?;
    Ok(ApiResponse::success(json!({ "message": LIKE_ADDED, "likes_count": likes_count })))
}

/// DELETE /api/{projects,ideas}/:id/like
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
    let likes_count = content_service::unlike::<T, dyn Store>(&*state.store, &user, id).await?;
    Ok(ApiResponse::success(json!({ "message": LIKE_REMOVED, "likes_count": likes_count })))
}
