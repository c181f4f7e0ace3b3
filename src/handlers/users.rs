use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::message_body;
use crate::middleware::ApiResponse;
use crate::services::profile_service;
use crate::state::AppState;

/// GET /api/users/stats. Failures answer `{ message }` rather than `{ error }`.
pub async fn stats(State(state): State<AppState>, user: AuthUser) -> ApiResponse<Value> {
    match profile_service::stats(&*state.store, user.id).await {
        Ok(counts) => ApiResponse::success(json!({
            "projectCount": counts.projects,
            "ideaCount": counts.ideas,
            "followerCount": 0,
            "likeCount": 0,
        })),
        Err(err) => ApiResponse::with_status(message_body(err.message()), err.status_code()),
    }
}
