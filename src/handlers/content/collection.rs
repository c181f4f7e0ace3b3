use axum::extract::{Query, State};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::database::models::Content;
use crate::database::{ContentStore, Store};
use crate::filter::{ListFilter, ListQuery};
use crate::middleware::{ApiResponse, ApiResult, JsonBody, OptionalUser};
use crate::services::content_service;
use crate::state::AppState;

/// GET /api/{projects,ideas} - paginated, filtered listing
pub async fn get<T>(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let filter = ListFilter::from_query(
        &query,
        T::KIND.default_page_size(),
        state.config.api.max_page_size,
    );
    let (items, pagination) =
        content_service::list::<T, dyn Store>(&*state.store, &filter, viewer.as_ref()).await?;

    Ok(ApiResponse::success(content_service::list_body(&items, &pagination)?))
}

/// POST /api/{projects,ideas}
pub async fn post<T>(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(draft): JsonBody<T::Draft>,
) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let item = content_service::create::<T, dyn Store>(&*state.store, &user, &draft).await?;
    Ok(ApiResponse::created(content_service::item_body(&item)?))
}
