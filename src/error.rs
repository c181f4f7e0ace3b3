// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};

use crate::database::DatabaseError;

/// HTTP API error with appropriate status codes and client-facing (Spanish) messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { message: String, extra: Map<String, Value> },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound { message: String, extra: Map<String, Value> },

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    Internal { message: String, extra: Map<String, Value> },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound { message, .. } => message,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::Internal { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body: `{ "error": message, ...extra }`
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.message().to_string()));
        if let ApiError::BadRequest { extra, .. }
        | ApiError::NotFound { extra, .. }
        | ApiError::Internal { extra, .. } = self
        {
            for (key, value) in extra {
                body.insert(key.clone(), value.clone());
            }
        }
        Value::Object(body)
    }

    /// Attach a diagnostic field (`details`, `hint`, `received`, ...) to the body.
    /// Variants without a diagnostic map are returned unchanged.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let ApiError::BadRequest { extra, .. }
        | ApiError::NotFound { extra, .. }
        | ApiError::Internal { extra, .. } = &mut self
        {
            extra.insert(key.to_string(), value.into());
        }
        self
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into(), extra: Map::new() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound { message: message.into(), extra: Map::new() }
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal { message: message.into(), extra: Map::new() }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Map a store failure to a 500 carrying `message`; the cause is logged, not exposed.
    /// A database that cannot be reached is a 503 instead.
    pub fn store(message: &'static str) -> impl FnOnce(DatabaseError) -> ApiError {
        move |err| {
            tracing::error!(error = %err, "{}", message);
            if err.is_unavailable() {
                return ApiError::service_unavailable(DATABASE_UNAVAILABLE);
            }
            ApiError::internal(message)
        }
    }

    /// Like [`ApiError::store`], but exposes the cause under `details`.
    pub fn store_with_details(message: &'static str) -> impl FnOnce(DatabaseError) -> ApiError {
        move |err| {
            tracing::error!(error = %err, "{}", message);
            if err.is_unavailable() {
                return ApiError::service_unavailable(DATABASE_UNAVAILABLE);
            }
            ApiError::internal(message).with("details", err.to_string())
        }
    }
}

pub const INTERNAL_ERROR: &str = "Error interno del servidor";
pub const NOT_AUTHENTICATED: &str = "Usuario no autenticado";
pub const DATABASE_UNAVAILABLE: &str = "Base de datos no disponible temporalmente";

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// Shorthand for the `{ "message": ... }` bodies used by success responses
pub fn message_body(message: &str) -> Value {
    json!({ "message": message })
}
