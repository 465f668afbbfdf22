use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod pages;
mod routes;
mod uploads;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("affectd starting");

    let config = Config::from_env();

    let store = affect_store::PredictionStore::open(&config.db_path).await?;
    tracing::info!(path = %config.db_path.display(), "prediction store opened");

    let uploads = uploads::UploadStore::new(&config.upload_dir)?;
    tracing::info!(dir = %config.upload_dir.display(), "upload directory ready");

    let engine = engine::spawn_engine(&config.model_path)?;

    let state = Arc::new(routes::AppState {
        engine,
        store,
        uploads,
    });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "affectd ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("affectd shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
