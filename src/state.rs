use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::avatar_service::AvatarStorage;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
    pub avatars: Arc<AvatarStorage>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let avatars = AvatarStorage::new(&config.uploads.dir, config.uploads.avatar_max_bytes);
        Self {
            config: Arc::new(config),
            store,
            identity,
            avatars: Arc::new(avatars),
        }
    }
}
