use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub const INVALID_JSON: &str = "JSON inválido en el cuerpo de la petición";
pub const BODY_TOO_LARGE: &str = "El cuerpo de la petición es demasiado grande";

/// `Json<T>` whose rejections use the API's error body
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    Err(ApiError::payload_too_large(BODY_TOO_LARGE))
                } else {
                    Err(ApiError::bad_request(INVALID_JSON))
                }
            }
        }
    }
}
