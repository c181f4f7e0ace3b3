use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::database::models::Content;
use crate::database::{ContentStore, Store};
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::content_service::{self, parse_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub content: Option<String>,
}

/// GET /api/{projects,ideas}/:id/comments - oldest first
pub async fn get<T>(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let id = parse_id::<T>(&id)?;
    let comments = content_service::comments::<T, dyn Store>(&*state.store, id)
        .await?
        .iter()
        .map(content_service::comment_value::<T>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiResponse::success(json!({ "comments": comments })))
}

/// POST /api/{projects,ideas}/:id/comments
pub async fn post<T>(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<NewComment>,
) -> ApiResult<Value>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    let id = parse_id::<T>(&id)?;
    let comment =
        content_service::add_comment::<T, dyn Store>(&*state.store, &user, id, body.content.as_deref())
            .await?;
    let comment = content_service::comment_value::<T>(&comment)?;
    Ok(ApiResponse::created(json!({ "comment": comment })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::testing::TestApp;

    #[tokio::test]
    async fn comments_are_trimmed_counted_and_ordered() {
        let app = TestApp::new();
        let (user, token) = app.user_with_profile("ana").await;
        let (_, created) = app
            .request(
                Method::POST,
                "/api/projects",
                Some(&token),
                Some(json!({ "title": "X", "description": "Y", "category": "web", "technologies": ["React"] })),
            )
            .await;
        let id = created["project"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/projects/{}/comments", id);

        let (status, body) = app
            .request(Method::POST, &uri, Some(&token), Some(json!({ "content": "  primero  " })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["comment"]["content"], "primero");
        assert_eq!(body["comment"]["author"]["id"], json!(user));
        assert_eq!(body["comment"]["project_id"], json!(id));
        assert!(body["comment"].get("parent_id").is_none());

        app.request(Method::POST, &uri, Some(&token), Some(json!({ "content": "segundo" })))
            .await;

        let (status, body) = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let contents: Vec<_> = body["comments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["content"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(contents, vec!["primero", "segundo"]);
        assert_eq!(body["comments"][1]["project_id"], json!(id));

        let (_, body) = app.request(Method::GET, &format!("/api/projects/{}", id), None, None).await;
        assert_eq!(body["project"]["comments_count"], 2);
    }

    #[tokio::test]
    async fn blank_comment_or_missing_parent() {
        let app = TestApp::new();
        let (_, token) = app.user_with_profile("ana").await;
        let uri = format!("/api/ideas/{}/comments", uuid::Uuid::new_v4());

        let (status, body) = app
            .request(Method::POST, &uri, Some(&token), Some(json!({ "content": "   " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "El contenido del comentario es requerido");

        let (status, body) = app
            .request(Method::POST, &uri, Some(&token), Some(json!({ "content": "hola" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Idea no encontrada");

        let (status, body) = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "comments": [] }));
    }
}
