use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins allowed by CORS; the frontend URL(s)
    pub frontend_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// When set, access tokens are verified locally instead of calling the provider
    pub jwt_secret: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub avatar_max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_page_size: i64,
    pub max_request_size_bytes: usize,
    pub default_log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("FRONTEND_URL") {
            let origins = split_list(&v);
            if !origins.is_empty() {
                self.server.frontend_urls = origins;
            }
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Auth overrides
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.auth.supabase_url = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.auth.supabase_anon_key = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_JWT_SECRET") {
            self.auth.jwt_secret = non_empty(v);
        }
        if let Ok(v) = env::var("AUTH_TIMEOUT_SECS") {
            self.auth.timeout_secs = v.parse().unwrap_or(self.auth.timeout_secs);
        }

        // Upload overrides
        if let Ok(v) = env::var("UPLOAD_DIR") {
            if !v.trim().is_empty() {
                self.uploads.dir = PathBuf::from(v);
            }
        }
        if let Ok(v) = env::var("AVATAR_MAX_BYTES") {
            self.uploads.avatar_max_bytes = v.parse().unwrap_or(self.uploads.avatar_max_bytes);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3001,
                frontend_urls: vec!["http://localhost:3000".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            auth: AuthConfig::default(),
            uploads: UploadConfig::default(),
            api: ApiConfig {
                max_page_size: 100,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                default_log_filter: "info,devibecoding_api=debug,tower_http=debug".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3001,
                frontend_urls: vec!["https://staging.devibecoding.com".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: false,
            },
            auth: AuthConfig::default(),
            uploads: UploadConfig::default(),
            api: ApiConfig {
                max_page_size: 100,
                max_request_size_bytes: 10 * 1024 * 1024,
                default_log_filter: "info,tower_http=info".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3001,
                frontend_urls: vec!["https://devibecoding.com".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            auth: AuthConfig {
                timeout_secs: 5,
                ..AuthConfig::default()
            },
            uploads: UploadConfig::default(),
            api: ApiConfig {
                max_page_size: 50,
                max_request_size_bytes: 10 * 1024 * 1024,
                default_log_filter: "warn,devibecoding_api=info".to_string(),
            },
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            jwt_secret: None,
            timeout_secs: 10,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            avatar_max_bytes: 5 * 1024 * 1024, // 5MB
        }
    }
}

fn non_empty(v: String) -> Option<String> {
    let trimmed = v.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
