use axum::extract::State;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET /api - service banner
pub async fn index() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "message": "Devibecoding backend funcionando",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "projects": "/api/projects",
            "ideas": "/api/ideas",
            "resources": "/api/resources",
            "profiles": "/api/profiles",
            "users": "/api/users",
        }
    }))
}

/// GET /api/health - pings the database
pub async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    match state.store.ping().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "healthy",
            "timestamp": timestamp,
            "database": "connected",
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            ApiResponse::with_status(
                json!({
                    "status": "unhealthy",
                    "timestamp": timestamp,
                    "database": "disconnected",
                    "error": "Database connection failed",
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}

/// Any route nobody else matched
pub async fn not_found() -> ApiResponse<Value> {
    ApiResponse::with_status(
        json!({
            "error": "Ruta no encontrada",
            "message": "La ruta solicitada no existe en este servidor",
        }),
        StatusCode::NOT_FOUND,
    )
}
