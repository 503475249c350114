//! # SEMA Common Library
//!
//! Shared code for the SEMA emotion inference engine:
//! - Emotion label set (closed enum) with color tokens and
//!   valence/arousal metadata
//! - Event types (SemaEvent enum) and the EventBus
//! - Global tunable parameters
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod labels;
pub mod params;

pub use error::{Error, Result};
pub use labels::Emotion;
