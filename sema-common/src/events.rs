//! Event types for the SEMA event system
//!
//! Provides shared event definitions and the EventBus used to fan out
//! engine activity (inference, training, feedback) to SSE clients and any
//! other in-process subscribers. The core engine never depends on a
//! subscriber being present.

use crate::labels::Emotion;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// SEMA event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SemaEvent {
    /// One inference completed
    InferenceCompleted {
        /// Winning emotion label
        primary: Emotion,
        /// Confidence in [0, 100]
        confidence: f32,
        /// Normalized energy-like intensity in [0, 1]
        intensity: f32,
        /// When the inference ran
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An experience was appended to the emotional memory log
    ExperienceRecorded {
        /// Experience UUID
        experience_id: Uuid,
        /// Derived emotional weight in [0, 1]
        emotional_weight: f32,
        /// When the experience was recorded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A baseline training run started
    TrainingStarted {
        /// Number of dataset records
        record_count: usize,
        /// When training started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A baseline training run completed and a revision was published
    TrainingCompleted {
        /// Published model revision
        version: i64,
        /// Final epoch loss
        final_loss: f32,
        /// False when the loss failed to improve over the trailing window
        converged: bool,
        /// When training completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A training run failed (dataset rejected, no revision published)
    TrainingFailed {
        /// Failure description
        message: String,
        /// When training failed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new model revision became the published revision
    ModelPublished {
        /// Revision version
        version: i64,
        /// When the swap happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A feedback correction was accepted
    FeedbackAccepted {
        /// Label the engine originally inferred
        original: Emotion,
        /// Label the user corrected to
        corrected: Emotion,
        /// True when this correction triggered an incremental retrain
        retraining: bool,
        /// When the correction was accepted
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SemaEvent {
    /// Event type name for SSE event framing
    pub fn event_type(&self) -> &'static str {
        match self {
            SemaEvent::InferenceCompleted { .. } => "InferenceCompleted",
            SemaEvent::ExperienceRecorded { .. } => "ExperienceRecorded",
            SemaEvent::TrainingStarted { .. } => "TrainingStarted",
            SemaEvent::TrainingCompleted { .. } => "TrainingCompleted",
            SemaEvent::TrainingFailed { .. } => "TrainingFailed",
            SemaEvent::ModelPublished { .. } => "ModelPublished",
            SemaEvent::FeedbackAccepted { .. } => "FeedbackAccepted",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SemaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// Capacity bounds how many events a slow subscriber can lag before
    /// it starts receiving `Lagged` errors. 100 is plenty for tests,
    /// 1000 for a live service.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SemaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if none are listening. Emitting into an empty bus is not a
    /// failure of the producer; callers typically `.ok()` the result.
    pub fn emit(&self, event: SemaEvent) -> Result<usize, broadcast::error::SendError<SemaEvent>> {
        self.tx.send(event)
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
