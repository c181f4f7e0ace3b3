use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::{role_or_default, AuthError, AuthUser, IdentityProvider, UserMetadata};

/// Asks the Supabase Auth server who owns a token (`GET /auth/v1/user`)
pub struct SupabaseIdentity {
    client: reqwest::Client,
    user_endpoint: Url,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

impl SupabaseIdentity {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let user_endpoint = user_endpoint(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            user_endpoint,
            anon_key: anon_key.to_string(),
        })
    }
}

fn user_endpoint(base_url: &str) -> Result<Url, AuthError> {
    let mut base = Url::parse(base_url)?;
    // Url::join drops the last path segment unless it ends with '/'
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("auth/v1/user")?)
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(self.user_endpoint.clone())
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                return Err(AuthError::Rejected(format!("provider answered {}", response.status())));
            }
            status => {
                return Err(AuthError::Unavailable(format!("provider answered {}", status)));
            }
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("unexpected user payload: {}", e)))?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            role: role_or_default(user.user_metadata),
        })
    }
}
