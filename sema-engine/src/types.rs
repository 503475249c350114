//! Core types for the SEMA engine
//!
//! Data units shared across trainer, engine, memory, and learner:
//! - `FeatureVector` — fixed-arity audio descriptors for one analysis window
//! - `EmotionalState` — one inference result, immutable after creation
//! - `Experience` / `ExperienceContext` — one memory log entry
//! - `EmotionalDna` — aggregate statistics derived from the memory log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sema_common::labels::Emotion;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Fixed feature arity agreed between trainer and engine
///
/// Index order: energy, spectral centroid, bass, mid, treble,
/// zero-crossing rate, spectral flux, roughness.
pub const FEATURE_ARITY: usize = 8;

/// Malformed feature input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
    /// Wrong number of features for the agreed arity
    #[error("expected {FEATURE_ARITY} features, got {actual}")]
    Arity {
        /// Number of features actually supplied
        actual: usize,
    },

    /// A feature value was NaN or infinite
    #[error("feature {index} is not finite")]
    NotFinite {
        /// Index of the offending feature
        index: usize,
    },
}

/// Fixed-arity numeric summary of one audio analysis window
///
/// Values are validated finite on construction and clamped to [0.0, 1.0],
/// the declared valid range for all descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f32; FEATURE_ARITY]);

impl FeatureVector {
    /// Build from a slice, validating arity and finiteness
    pub fn new(values: &[f32]) -> Result<Self, FeatureError> {
        if values.len() != FEATURE_ARITY {
            return Err(FeatureError::Arity {
                actual: values.len(),
            });
        }
        let mut clamped = [0.0f32; FEATURE_ARITY];
        for (index, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(FeatureError::NotFinite { index });
            }
            clamped[index] = value.clamp(0.0, 1.0);
        }
        Ok(Self(clamped))
    }

    /// All descriptors in index order
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Energy descriptor (index 0), used as the intensity source
    pub fn energy(&self) -> f32 {
        self.0[0]
    }
}

/// One inference result
///
/// Created once per `EmotionEngine::infer` call; immutable after creation.
/// Consumed by the emotional memory and by rendering collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalState {
    /// Winning emotion label (arg-max of the final distribution)
    pub primary: Emotion,
    /// Probability of `primary`, scaled to [0, 100]
    pub confidence: f32,
    /// Entropy of the final distribution, scaled to [0, 100]
    ///
    /// 0 means the distribution collapsed onto one label; 100 means it was
    /// maximally spread.
    pub depth: f32,
    /// Normalized energy-like intensity in [0, 1]
    pub intensity: f32,
    /// Color tokens for `primary` (always non-empty)
    pub colors: Vec<String>,
    /// The originating feature vector
    pub features: FeatureVector,
    /// When the inference ran
    pub timestamp: DateTime<Utc>,
}

/// Context attached to a recorded experience
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceContext {
    /// Where the inference came from (e.g. "live", "replay")
    pub source: String,
    /// Seconds into the listening session when the state was produced
    pub session_duration: f64,
    /// User feedback label, when a correction was attached later
    pub user_feedback: Option<Emotion>,
}

impl ExperienceContext {
    pub fn new(source: impl Into<String>, session_duration: f64) -> Self {
        Self {
            source: source.into(),
            session_duration,
            user_feedback: None,
        }
    }
}

/// One emotional memory entry
///
/// Appended on every inference, never mutated, pruned FIFO by capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    /// Entry UUID
    pub id: Uuid,
    /// The recorded state
    pub state: EmotionalState,
    /// Recording context
    pub context: ExperienceContext,
    /// Derived scalar in [min_emotional_weight, 1.0]; higher confidence and
    /// higher intensity each increase it
    pub emotional_weight: f32,
}

/// Aggregate statistics derived from the memory log
///
/// Recomputed deterministically from the current log on demand; never
/// hand-edited, never cached across records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalDna {
    /// Labels ranked by weighted frequency, most dominant first,
    /// with their normalized weights
    pub dominant_emotions: Vec<(Emotion, f32)>,
    /// Normalized entropy of the label distribution over the log, in [0, 1]
    pub emotional_complexity: f32,
    /// Hour-of-day (UTC, 0-23) → label occurrence counts
    pub time_patterns: BTreeMap<u32, BTreeMap<Emotion, u32>>,
}

impl EmotionalDna {
    /// DNA of an empty log: no dominants, zero complexity, no patterns
    pub fn empty() -> Self {
        Self {
            dominant_emotions: Vec::new(),
            emotional_complexity: 0.0,
            time_patterns: BTreeMap::new(),
        }
    }
}
