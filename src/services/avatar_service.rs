use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const AVATAR_SUBDIR: &str = "avatars";
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Avatar files on local disk, served back under `/uploads/avatars/`
#[derive(Debug, Clone)]
pub struct AvatarStorage {
    root: PathBuf,
    max_bytes: usize,
}

/// A written avatar file and the URL it is served at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAvatar {
    pub path: PathBuf,
    pub url: String,
}

impl AvatarStorage {
    pub fn new(upload_dir: impl AsRef<Path>, max_bytes: usize) -> Self {
        Self {
            root: upload_dir.as_ref().to_path_buf(),
            max_bytes,
        }
    }

    /// Root of everything served under `/uploads`
    pub fn upload_dir(&self) -> &Path {
        &self.root
    }

    pub fn avatar_dir(&self) -> PathBuf {
        self.root.join(AVATAR_SUBDIR)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.avatar_dir()).await
    }

    pub async fn save(
        &self,
        user_id: Uuid,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> std::io::Result<StoredAvatar> {
        self.ensure_dir().await?;
        let name = file_name(user_id, original_name, Utc::now());
        let path = self.avatar_dir().join(&name);
        tokio::fs::write(&path, bytes).await?;

        Ok(StoredAvatar {
            path,
            url: format!("{}/{}/{}", PUBLIC_PREFIX, AVATAR_SUBDIR, name),
        })
    }

    /// Remove a file whose profile update failed
    pub async fn discard(&self, avatar: &StoredAvatar) {
        if let Err(e) = tokio::fs::remove_file(&avatar.path).await {
            tracing::warn!(path = %avatar.path.display(), error = %e, "Could not remove orphaned avatar");
        }
    }
}

/// `avatar-<userId>-<unixMillis><ext>`, keeping the upload's extension
pub fn file_name(user_id: Uuid, original_name: Option<&str>, now: DateTime<Utc>) -> String {
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("avatar-{}-{}{}", user_id, now.timestamp_millis(), extension)
}

pub fn is_image(content_type: Option<&str>) -> bool {
    content_type.map_or(false, |ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
}
