use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemFileStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scorecard_server::config::AppConfig;
use scorecard_server::state::AppState;
use scorecard_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorecard_server=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database ready");

    seed::sync_staff_flags(&db).await?;
    seed::backfill_profiles(&db).await?;
    seed::bootstrap_admin(&db, config.auth.bootstrap_admin.as_ref()).await?;

    let storage_root = PathBuf::from(&config.storage.root);
    let file_store = FilesystemFileStore::new(storage_root, config.storage.max_upload_size)
        .await
        .with_context(|| format!("Failed to open storage at {}", config.storage.root))?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        file_store: Arc::new(file_store),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{addr}");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
