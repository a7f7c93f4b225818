use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paperforge_server::config::Config;
use paperforge_core::domain::job::JobKind;
use paperforge_server::generator::{Generator, ProcessGenerator};
use paperforge_server::repository::{InMemoryJobStore, JobStore, PgJobStore};
use paperforge_server::storage::FilesystemBlobStore;
use paperforge_server::{AppState, api, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperforge_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Paperforge server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let store: Arc<dyn JobStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgJobStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, job records are kept in memory only");
            Arc::new(InMemoryJobStore::new())
        }
    };

    let blobs = FilesystemBlobStore::new(config.storage_dir.clone(), config.files_url())
        .await
        .context("Failed to initialize blob storage")?;
    for dir in [&config.upload_dir, &config.output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let generator = ProcessGenerator::new(config.generator.clone());
    for kind in [JobKind::SlideDeck, JobKind::Podcast] {
        if let Err(e) = generator.check_available(kind) {
            tracing::warn!("{} submissions will be rejected: {}", kind, e);
        }
    }
    let addr = config.bind_addr.clone();

    let state = AppState::new(config, store, Arc::new(blobs), Arc::new(generator));
    state
        .generations
        .recover_interrupted()
        .await
        .context("Failed to recover interrupted generations")?;
    let app = api::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
