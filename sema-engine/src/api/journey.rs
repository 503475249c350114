//! Emotional memory read endpoints
//!
//! GET /journey returns the recent experience log (most recent first);
//! GET /insights returns the derived emotional DNA.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::types::{EmotionalDna, Experience};
use crate::AppState;

/// GET /journey query parameters
#[derive(Debug, Deserialize)]
pub struct JourneyQuery {
    /// Maximum entries to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// GET /journey response
#[derive(Debug, Serialize)]
pub struct JourneyResponse {
    /// Experiences, most recent first
    pub experiences: Vec<Experience>,
    /// Total entries currently in the log
    pub total: usize,
}

/// GET /journey
pub async fn recent_journey(
    State(state): State<AppState>,
    Query(query): Query<JourneyQuery>,
) -> Json<JourneyResponse> {
    let experiences = state.memory.recent_journey(query.limit);
    Json(JourneyResponse {
        experiences,
        total: state.memory.len(),
    })
}

/// GET /insights
///
/// Recomputed from the current log on every call; an empty log returns
/// the empty DNA rather than an error.
pub async fn insights(State(state): State<AppState>) -> Json<EmotionalDna> {
    Json(state.memory.insights())
}

/// Build memory read routes
pub fn journey_routes() -> Router<AppState> {
    Router::new()
        .route("/journey", get(recent_journey))
        .route("/insights", get(insights))
}
