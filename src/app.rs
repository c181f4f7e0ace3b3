use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::database::models::{Content, Idea, Project};
use crate::database::{ContentStore, Store};
use crate::handlers::{content, profiles, resources, system, users};
use crate::state::AppState;

/// Room for multipart framing around the avatar itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        // Public
        .route("/", get(system::index))
        .route("/health", get(system::health))
        // Content
        .nest("/projects", content_routes::<Project>())
        .nest("/ideas", content_routes::<Idea>())
        .nest("/resources", resource_routes())
        // Signed-in user
        .nest("/profiles", profile_routes(state.avatars.max_bytes()))
        .nest("/users", user_routes());

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(state.avatars.upload_dir()))
        .fallback(system::not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Projects and ideas share one route table
fn content_routes<T>() -> Router<AppState>
where
    T: Content,
    dyn Store: ContentStore<T>,
{
    Router::new()
        .route("/", get(content::list_get::<T>).post(content::list_post::<T>))
        .route(
            "/:id",
            get(content::item_get::<T>)
                .put(content::item_put::<T>)
                .delete(content::item_delete::<T>),
        )
        .route(
            "/:id/like",
            axum::routing::post(content::like_post::<T>).delete(content::like_delete::<T>),
        )
        .route(
            "/:id/comments",
            get(content::comments_get::<T>).post(content::comments_post::<T>),
        )
}

fn resource_routes() -> Router<AppState> {
    Router::new().route("/", get(resources::get).post(resources::post))
}

fn profile_routes(avatar_max_bytes: usize) -> Router<AppState> {
    use axum::routing::post;

    Router::new()
        .route("/me", get(profiles::me_get).put(profiles::me_put))
        .route(
            "/me/avatar",
            post(profiles::avatar_post)
                .layer(DefaultBodyLimit::max(avatar_max_bytes + MULTIPART_OVERHEAD)),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new().route("/stats", get(users::stats))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .frontend_urls
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
