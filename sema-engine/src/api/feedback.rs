//! Feedback API handler
//!
//! POST /feedback applies one user correction against a recorded
//! experience. Labels outside the closed emotion set are rejected with
//! 400 and change nothing.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use sema_common::events::SemaEvent;
use sema_common::labels::Emotion;

/// POST /feedback request
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// Experience the user is correcting
    pub experience_id: Uuid,
    /// The label the user says it should have been
    pub corrected_label: String,
}

/// POST /feedback response
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: String,
    /// Label the engine originally inferred
    pub original: Emotion,
    /// Accepted corrected label
    pub corrected: Emotion,
    /// Model revision after the correction
    pub model_version: i64,
    /// True when this correction triggered an incremental retrain
    pub retraining: bool,
}

/// POST /feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<FeedbackResponse>> {
    let experience = state.memory.find(request.experience_id).ok_or_else(|| {
        ApiError::NotFound(format!(
            "experience {} not found in memory",
            request.experience_id
        ))
    })?;

    let outcome = state
        .learner
        .correct(&experience.state, &request.corrected_label)
        .await?;

    // parse succeeded inside correct(), so this cannot fail
    let corrected = Emotion::parse(&request.corrected_label)
        .ok_or_else(|| ApiError::Internal("corrected label vanished".to_string()))?;
    let retraining = outcome.retrain.is_some();

    state
        .event_bus
        .emit(SemaEvent::FeedbackAccepted {
            original: experience.state.primary,
            corrected,
            retraining,
            timestamp: Utc::now(),
        })
        .ok();

    // The retrain runs to completion and publishes on its own; the
    // response does not wait for it.
    if let Some(handle) = outcome.retrain {
        let event_bus = state.event_bus.clone();
        tokio::spawn(async move {
            if let Ok(version) = handle.await {
                event_bus
                    .emit(SemaEvent::ModelPublished {
                        version,
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
        });
    }

    Ok(Json(FeedbackResponse {
        status: "accepted".to_string(),
        original: experience.state.primary,
        corrected,
        model_version: outcome.version,
        retraining,
    }))
}

/// Build feedback routes
pub fn feedback_routes() -> Router<AppState> {
    Router::new().route("/feedback", post(submit_feedback))
}
