pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::probe::HttpProbe;
use crate::services::storage::{BlobStore, MemoryBlobStore, S3BlobStore};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let store: Arc<dyn BlobStore> = match S3BlobStore::from_settings(&settings).await? {
        Some(store) => Arc::new(store),
        None => {
            tracing::warn!("S3 credentials not configured; assignments are kept in memory only");
            Arc::new(MemoryBlobStore::new())
        }
    };
    let probe = Arc::new(HttpProbe::from_settings(&settings)?);

    let state = AppState::new(settings, store, probe);
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        storage = state.store().backend(),
        "Assignments API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    tracing::info!("Assignments API stopped");
    Ok(())
}
