//! sema-engine library interface
//!
//! Exposes the inference pipeline, training, memory, and feedback
//! components plus the HTTP surface for integration testing.

pub mod affinity;
pub mod api;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod learner;
pub mod memory;
pub mod nn;
pub mod personality;
pub mod store;
pub mod trainer;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::engine::EmotionEngine;
use crate::learner::FeedbackLearner;
use crate::memory::EmotionalMemory;
use crate::store::{ModelSlot, ModelStore};
use sema_common::config::TrainingSection;
use sema_common::events::EventBus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Durable model store (SQLite in production, in-memory in tests)
    pub store: Arc<dyn ModelStore>,
    /// Publication slot the engine reads from
    pub slot: Arc<ModelSlot>,
    /// Inference engine
    pub engine: Arc<EmotionEngine>,
    /// Bounded emotional memory log
    pub memory: Arc<EmotionalMemory>,
    /// Feedback learner
    pub learner: Arc<FeedbackLearner>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Training configuration for baseline runs
    pub training_config: TrainingSection,
    /// Guards against concurrent training runs
    pub training_active: Arc<AtomicBool>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ModelStore>,
        slot: Arc<ModelSlot>,
        event_bus: EventBus,
        training_config: TrainingSection,
    ) -> Self {
        let engine = Arc::new(EmotionEngine::new(Arc::clone(&slot)));
        let learner = Arc::new(FeedbackLearner::new(Arc::clone(&slot), Arc::clone(&store)));
        Self {
            store,
            slot,
            engine,
            memory: Arc::new(EmotionalMemory::new()),
            learner,
            event_bus,
            training_config,
            training_active: Arc::new(AtomicBool::new(false)),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::inference_routes())
        .merge(api::feedback_routes())
        .merge(api::journey_routes())
        .merge(api::training_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
}
