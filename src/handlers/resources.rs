use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::database::models::{NewResource, Resource};
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::resource_service;
use crate::state::AppState;

/// GET /api/resources - newest first, `{ data: [...] }`
pub async fn get(State(state): State<AppState>) -> ApiResult<Value> {
    let resources = resource_service::list(&*state.store).await?;
    Ok(ApiResponse::success(json!({ "data": resources })))
}

/// POST /api/resources - responds with the bare row
pub async fn post(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(draft): JsonBody<NewResource>,
) -> ApiResult<Resource> {
    let resource = resource_service::create(&*state.store, &user, &draft).await?;
    Ok(ApiResponse::created(resource))
}
