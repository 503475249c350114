//! Inference API handler
//!
//! POST /infer runs the full pipeline for one analysis window and records
//! the result in the emotional memory log.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::types::{EmotionalState, ExperienceContext};
use crate::AppState;
use sema_common::events::SemaEvent;

/// POST /infer request
#[derive(Debug, Deserialize)]
pub struct InferRequest {
    /// One analysis window of normalized audio features
    pub features: Vec<f32>,
    /// Optional genre hint for the affinity blend
    pub genre: Option<String>,
    /// What produced this window (player, import, test rig)
    #[serde(default = "default_source")]
    pub source: String,
    /// Seconds into the listening session
    #[serde(default)]
    pub session_duration: f64,
    /// Apply the emotional-memory nudge (on by default)
    #[serde(default = "default_use_memory")]
    pub use_memory: bool,
}

fn default_source() -> String {
    "api".to_string()
}

fn default_use_memory() -> bool {
    true
}

/// POST /infer response
#[derive(Debug, Serialize)]
pub struct InferResponse {
    /// Id of the recorded experience, usable for feedback
    pub experience_id: Uuid,
    /// The inferred emotional state
    pub state: EmotionalState,
    /// Weight the experience entered the memory log with
    pub emotional_weight: f32,
    /// Model revision the inference ran against
    pub model_version: i64,
}

/// POST /infer
pub async fn infer(
    State(state): State<AppState>,
    Json(request): Json<InferRequest>,
) -> ApiResult<Json<InferResponse>> {
    let dna = if request.use_memory {
        Some(state.memory.insights())
    } else {
        None
    };

    let emotional_state = state.engine.infer(
        &request.features,
        request.genre.as_deref(),
        dna.as_ref(),
    )?;
    // infer succeeded, so a revision is published
    let model_version = state.slot.version().unwrap_or(0);

    let context = ExperienceContext::new(&request.source, request.session_duration);
    let experience = state
        .memory
        .record(emotional_state.clone(), context);

    state
        .event_bus
        .emit(SemaEvent::InferenceCompleted {
            primary: emotional_state.primary,
            confidence: emotional_state.confidence,
            intensity: emotional_state.intensity,
            timestamp: emotional_state.timestamp,
        })
        .ok();
    state
        .event_bus
        .emit(SemaEvent::ExperienceRecorded {
            experience_id: experience.id,
            emotional_weight: experience.emotional_weight,
            timestamp: emotional_state.timestamp,
        })
        .ok();

    Ok(Json(InferResponse {
        experience_id: experience.id,
        state: emotional_state,
        emotional_weight: experience.emotional_weight,
        model_version,
    }))
}

/// Build inference routes
pub fn inference_routes() -> Router<AppState> {
    Router::new().route("/infer", post(infer))
}
