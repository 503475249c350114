//! sema-engine - Emotion Inference & Personalization Service
//!
//! Trains a baseline emotion classifier from labeled audio features,
//! serves personality-biased real-time inference over HTTP, keeps a
//! bounded emotional memory log, and folds user corrections back into
//! the published model.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sema_common::config::TomlConfig;
use sema_common::events::EventBus;
use sema_engine::store::{ModelSlot, ModelStore, SqliteModelStore};
use sema_engine::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting sema-engine (Emotion Inference) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = TomlConfig::resolve()?;
    info!("Model store: {}", config.database_path.display());

    let store = SqliteModelStore::open(&config.database_path).await?;
    info!("Model store connection established");

    // Republish the latest persisted revision so inference survives a
    // restart without retraining
    let slot = Arc::new(ModelSlot::empty());
    match store.latest().await? {
        Some(revision) => {
            info!(version = revision.version, "Restored model revision");
            slot.publish(revision);
        }
        None => {
            warn!("No persisted model revision; inference unavailable until trained");
        }
    }

    let event_bus = EventBus::new(1000);
    let bind_address = config.bind_address.clone();
    let state = AppState::new(
        Arc::new(store),
        slot,
        event_bus,
        config.training,
    );

    let app = sema_engine::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
