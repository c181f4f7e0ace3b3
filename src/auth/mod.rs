//! Identity verification.
//!
//! Tokens are issued by the hosted identity provider (Supabase Auth); this
//! service never mints credentials for clients. An [`IdentityProvider`] turns a
//! bearer token into an [`AuthUser`] or rejects it.

pub mod jwt;
pub mod supabase;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;

pub use jwt::{Claims, JwtIdentity};
pub use supabase::SupabaseIdentity;

/// Role assigned when the provider carries no `user_metadata.role`
pub const DEFAULT_ROLE: &str = "user";

/// Authenticated caller, threaded explicitly through handlers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

impl AuthUser {
    pub fn has_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| *r == self.role)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct UserMetadata {
    pub role: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider looked at the token and said no
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The provider could not be asked
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider not configured: set SUPABASE_JWT_SECRET or SUPABASE_URL and SUPABASE_ANON_KEY")]
    NotConfigured,

    #[error("invalid identity provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// Pick the provider for this deployment: local JWT verification when the
/// project secret is known, otherwise the provider's `/auth/v1/user` endpoint.
pub fn provider_from_config(config: &AuthConfig) -> Result<Arc<dyn IdentityProvider>, AuthError> {
    if let Some(secret) = &config.jwt_secret {
        tracing::info!("Verifying access tokens locally with the project JWT secret");
        return Ok(Arc::new(JwtIdentity::new(secret)));
    }

    match (&config.supabase_url, &config.supabase_anon_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Verifying access tokens against {}", url);
            let provider =
                SupabaseIdentity::new(url, key, Duration::from_secs(config.timeout_secs))?;
            Ok(Arc::new(provider))
        }
        _ => Err(AuthError::NotConfigured),
    }
}

fn role_or_default(metadata: Option<UserMetadata>) -> String {
    metadata
        .and_then(|m| m.role)
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_ROLE.to_string())
}
