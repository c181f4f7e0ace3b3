use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::database::models::{Profile, ProfileChanges};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::profile_service::{self, AvatarUpload, AVATAR_MISSING, AVATAR_UPDATED};
use crate::state::AppState;

/// Multipart field carrying the image
pub const AVATAR_FIELD: &str = "avatar";

/// GET /api/profiles/me
pub async fn me_get(State(state): State<AppState>, user: AuthUser) -> ApiResult<Profile> {
    let profile = profile_service::get(&*state.store, &user).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profiles/me
pub async fn me_put(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(changes): JsonBody<ProfileChanges>,
) -> ApiResult<Profile> {
    let profile = profile_service::update(&*state.store, &user, &changes).await?;
    Ok(ApiResponse::success(profile))
}

/// POST /api/profiles/me/avatar - multipart upload in the `avatar` field
pub async fn avatar_post(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Avatar upload is not multipart");
        ApiError::bad_request(AVATAR_MISSING)
    })?;

    let max_bytes = state.avatars.max_bytes();
    let upload = read_avatar(&mut multipart, max_bytes).await?;
    let upload = profile_service::validate_avatar(upload.as_ref(), max_bytes)?;

    let (avatar_url, profile) =
        profile_service::upload_avatar(&*state.store, &state.avatars, &user, upload).await?;

    Ok(ApiResponse::success(json!({
        "message": AVATAR_UPDATED,
        "avatar_url": avatar_url,
        "profile": profile,
    })))
}

/// Buffer the `avatar` field, stopping one byte past the ceiling
async fn read_avatar(multipart: &mut Multipart, max_bytes: usize) -> Result<Option<AvatarUpload>, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error(max_bytes))? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error(max_bytes))? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > max_bytes {
                break;
            }
        }

        return Ok(Some(AvatarUpload {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

fn multipart_error(max_bytes: usize) -> impl Fn(MultipartError) -> ApiError {
    move |err| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(profile_service::avatar_too_large(max_bytes))
        } else {
            tracing::debug!(reason = %err.body_text(), "Malformed multipart body");
            ApiError::bad_request(AVATAR_MISSING)
        }
    }
}
