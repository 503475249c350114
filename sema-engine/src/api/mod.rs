//! HTTP API handlers for sema-engine
//!
//! REST endpoints plus an SSE stream of engine activity.

pub mod feedback;
pub mod health;
pub mod inference;
pub mod journey;
pub mod sse;
pub mod training;

pub use feedback::feedback_routes;
pub use health::health_routes;
pub use inference::inference_routes;
pub use journey::journey_routes;
pub use sse::event_stream;
pub use training::training_routes;
