use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{role_or_default, AuthError, AuthUser, IdentityProvider, UserMetadata};

/// Audience Supabase stamps on access tokens of signed-in users
pub const AUDIENCE: &str = "authenticated";

/// Claims of a Supabase access token (the subset this service reads)
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Postgres role, `authenticated` for normal sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<ClaimsMetadata>,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ClaimsMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    pub fn new(user: &AuthUser, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            aud: AUDIENCE.to_string(),
            email: user.email.clone(),
            role: Some(AUDIENCE.to_string()),
            user_metadata: Some(ClaimsMetadata { role: Some(user.role.clone()) }),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Verifies HS256 access tokens with the project's JWT secret
pub struct JwtIdentity {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token the same way the provider would
    pub fn issue(&self, user: &AuthUser, ttl: Duration) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), &Claims::new(user, ttl), &self.encoding_key)
            .map_err(|e| AuthError::Unavailable(format!("JWT generation error: {}", e)))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Rejected(format!("Invalid JWT token: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentity {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.decode(token)?;
        let metadata = claims.user_metadata.map(|m| UserMetadata { role: m.role });
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: role_or_default(metadata),
        })
    }
}
