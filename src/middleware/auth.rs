use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::warn;

use crate::auth::{AuthError, AuthUser};
use crate::error::{ApiError, NOT_AUTHENTICATED};
use crate::state::AppState;

pub const TOKEN_REQUIRED: &str = "Token de acceso requerido";
pub const TOKEN_REJECTED: &str = "Token inválido o expirado";
pub const TOKEN_UNVERIFIABLE: &str = "Token inválido";
pub const ROLE_DENIED: &str = "No tienes permisos para acceder a este recurso";

/// Required authentication: extracting an [`AuthUser`] rejects the request
/// unless the bearer token verifies.
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(&parts.headers).ok_or_else(|| ApiError::unauthorized(TOKEN_REQUIRED))?;

        match state.identity.verify(token).await {
            Ok(user) => {
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(AuthError::Rejected(reason)) => {
                warn!(%reason, "Rejected access token");
                Err(ApiError::forbidden(TOKEN_REJECTED))
            }
            Err(err) => {
                warn!(error = %err, "Could not verify access token");
                Err(ApiError::forbidden(TOKEN_UNVERIFIABLE))
            }
        }
    }
}

/// Optional authentication: a missing or bad token means an anonymous caller
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthUser>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if bearer_token(&parts.headers).is_none() {
            return Ok(OptionalUser(None));
        }
        Ok(OptionalUser(AuthUser::from_request_parts(parts, state).await.ok()))
    }
}

/// Gate on the caller's role
pub fn require_role<'a>(user: Option<&'a AuthUser>, roles: &[&str]) -> Result<&'a AuthUser, ApiError> {
    let user = user.ok_or_else(|| ApiError::unauthorized(NOT_AUTHENTICATED))?;
    if !user.has_role(roles) {
        return Err(ApiError::forbidden(ROLE_DENIED));
    }
    Ok(user)
}

/// Token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
