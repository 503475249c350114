//! Training API handler
//!
//! POST /train validates the submitted dataset synchronously, then runs
//! the baseline trainer in a background task and publishes the resulting
//! revision atomically. Only one training run at a time; a second request
//! while one is active gets 409.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use tracing::{error, info};

use crate::dataset::{self, DatasetRecord};
use crate::error::{ApiError, ApiResult};
use crate::trainer::BaselineTrainer;
use crate::AppState;
use sema_common::events::SemaEvent;

/// POST /train request
#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    /// Labeled feature records
    pub records: Vec<DatasetRecord>,
}

/// POST /train response
#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: String,
    pub record_count: usize,
}

/// POST /train
///
/// Dataset validation is all-or-nothing and happens before the request
/// returns, so a malformed dataset is a 400 naming the offending record
/// and nothing starts. Training itself runs in the background; progress
/// goes out on the event stream.
pub async fn start_training(
    State(state): State<AppState>,
    Json(request): Json<TrainRequest>,
) -> ApiResult<Json<TrainResponse>> {
    if state
        .training_active
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(ApiError::Conflict("training already running".to_string()));
    }

    if let Err(e) = dataset::validate(&request.records) {
        state.training_active.store(false, Ordering::SeqCst);
        return Err(ApiError::BadRequest(e.to_string()));
    }

    let record_count = request.records.len();
    state
        .event_bus
        .emit(SemaEvent::TrainingStarted {
            record_count,
            timestamp: Utc::now(),
        })
        .ok();

    let app = state.clone();
    let records = request.records;
    tokio::spawn(async move {
        let trainer = BaselineTrainer::new(app.training_config.clone());
        match trainer.train(&records, app.store.as_ref()).await {
            Ok(output) => {
                let final_loss = output.final_loss;
                let converged = output.convergence.is_none();
                let fallback = app.slot.version().unwrap_or(0) + 1;
                let version = app.slot.publish(output.into_revision(fallback)).version;

                info!(version, final_loss, "Training run published");
                app.event_bus
                    .emit(SemaEvent::TrainingCompleted {
                        version,
                        final_loss,
                        converged,
                        timestamp: Utc::now(),
                    })
                    .ok();
                app.event_bus
                    .emit(SemaEvent::ModelPublished {
                        version,
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
            Err(e) => {
                error!("Training run failed: {}", e);
                app.event_bus
                    .emit(SemaEvent::TrainingFailed {
                        message: e.to_string(),
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
        }
        app.training_active.store(false, Ordering::SeqCst);
    });

    Ok(Json(TrainResponse {
        status: "started".to_string(),
        record_count,
    }))
}

/// Build training routes
pub fn training_routes() -> Router<AppState> {
    Router::new().route("/train", post(start_training))
}
