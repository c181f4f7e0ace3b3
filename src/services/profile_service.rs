use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{Profile, ProfileChanges};
use crate::database::{AuthoredCounts, Store};
use crate::error::ApiError;
use crate::services::avatar_service::{is_image, AvatarStorage};

pub const PROFILE_NOT_FOUND: &str = "Perfil no encontrado";
pub const PROFILE_FAILED: &str = "Error al obtener perfil";
pub const PROFILE_UPDATE_FAILED: &str = "Error al actualizar perfil";
pub const AVATAR_UPDATED: &str = "Avatar actualizado correctamente";
pub const AVATAR_FAILED: &str = "Error al actualizar avatar";
pub const AVATAR_MISSING: &str = "No se proporcionó archivo";
pub const AVATAR_NOT_IMAGE: &str = "Solo se permiten archivos de imagen";
pub const STATS_FAILED: &str = "Error al obtener estadísticas del usuario";

/// A file received in the `avatar` multipart field
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub async fn get(store: &dyn Store, user: &AuthUser) -> Result<Profile, ApiError> {
    store
        .profile(user.id)
        .await
        .map_err(ApiError::store(PROFILE_FAILED))?
        .ok_or_else(|| ApiError::not_found(PROFILE_NOT_FOUND))
}

pub async fn update(
    store: &dyn Store,
    user: &AuthUser,
    changes: &ProfileChanges,
) -> Result<Profile, ApiError> {
    store
        .update_profile(user.id, changes)
        .await
        .map_err(ApiError::store(PROFILE_UPDATE_FAILED))?
        .ok_or_else(|| ApiError::not_found(PROFILE_NOT_FOUND))
}

/// Checks the upload before anything touches the disk
/// "El archivo excede el tamaño máximo de 5MB" for the configured ceiling
pub fn avatar_too_large(max_bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    let size = match max_bytes {
        n if n >= MB && n % MB == 0 => format!("{}MB", n / MB),
        n if n >= KB && n % KB == 0 => format!("{}KB", n / KB),
        n => format!("{} bytes", n),
    };
    format!("El archivo excede el tamaño máximo de {}", size)
}

pub fn validate_avatar(upload: Option<&AvatarUpload>, max_bytes: usize) -> Result<&AvatarUpload, ApiError> {
    let upload = upload.ok_or_else(|| ApiError::bad_request(AVATAR_MISSING))?;
    if !is_image(upload.content_type.as_deref()) {
        return Err(ApiError::bad_request(AVATAR_NOT_IMAGE));
    }
    if upload.bytes.len() > max_bytes {
        return Err(ApiError::bad_request(avatar_too_large(max_bytes)));
    }
    Ok(upload)
}

/// Write the file, then point the profile at it. The file is removed again
/// when the profile cannot be updated.
pub async fn upload_avatar(
    store: &dyn Store,
    storage: &AvatarStorage,
    user: &AuthUser,
    upload: &AvatarUpload,
) -> Result<(String, Profile), ApiError> {
    let stored = storage
        .save(user.id, upload.file_name.as_deref(), &upload.bytes)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Could not write avatar file");
            ApiError::internal(AVATAR_FAILED)
        })?;

    match store.set_avatar_url(user.id, &stored.url).await {
        Ok(Some(profile)) => {
            tracing::info!(user = %user.id, url = %stored.url, "Avatar updated");
            Ok((stored.url, profile))
        }
        Ok(None) => {
            tracing::error!(user = %user.id, "No profile row to attach avatar to");
            storage.discard(&stored).await;
            Err(ApiError::internal(AVATAR_FAILED))
        }
        Err(e) => {
            tracing::error!(error = %e, "{}", AVATAR_FAILED);
            storage.discard(&stored).await;
            Err(ApiError::internal(AVATAR_FAILED))
        }
    }
}

pub async fn stats(store: &dyn Store, user_id: Uuid) -> Result<AuthoredCounts, ApiError> {
    store
        .authored_counts(user_id)
        .await
        .map_err(ApiError::store(STATS_FAILED))
}
