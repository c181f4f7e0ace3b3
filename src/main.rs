use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devibecoding_api::auth::provider_from_config;
use devibecoding_api::config::AppConfig;
use devibecoding_api::database::{DatabaseManager, PgStore};
use devibecoding_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.api.default_log_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Devibecoding API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database).context("database configuration")?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await.context("running migrations")?;
    }

    let identity = provider_from_config(&config.auth).context("identity provider configuration")?;

    let state = AppState::new(config, Arc::new(PgStore::new(pool.clone())), identity);
    state
        .avatars
        .ensure_dir()
        .await
        .with_context(|| format!("creating {}", state.avatars.avatar_dir().display()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Devibecoding API listening on http://{}", addr);
    tracing::info!("CORS enabled for {}", state.config.server.frontend_urls.join(", "));

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
