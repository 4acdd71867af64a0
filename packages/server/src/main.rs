use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use lumen_common::FilesystemMediaStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lumen_server::config::AppConfig;
use lumen_server::state::AppState;
use lumen_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    seed::seed_default_admin(&db, &config.admin)
        .await
        .context("Failed to seed default admin")?;

    let media = FilesystemMediaStore::new(
        config.storage.root.clone(),
        config.storage.public_prefix.clone(),
    )
    .await
    .context("Failed to prepare storage root")?;
    info!(root = %config.storage.root.display(), "Media storage ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState {
        db,
        config,
        media: Arc::new(media),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
