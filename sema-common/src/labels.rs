//! Closed emotion label set
//!
//! Every classifier output, memory entry, and feedback correction refers to
//! one of these labels. The set is fixed at build time: training data or
//! feedback carrying a label outside this set is rejected, never coerced.
//!
//! Each label carries fixed metadata used across the engine:
//! - **valence** in [-1.0, 1.0]: negative ↔ positive affect
//! - **arousal** in [0.0, 1.0]: calm ↔ activated
//! - **color tokens**: deterministic, non-empty palette for rendering
//!   consumers (the engine never interprets the colors itself)

use serde::{Deserialize, Serialize};

/// Number of emotion labels in the closed set
pub const EMOTION_COUNT: usize = 12;

/// One emotion category from the closed set
///
/// Variant order is the canonical index order used for classifier output
/// distributions; `index()` and `from_index()` round-trip through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Nostalgia,
    Awe,
    Determination,
    Serenity,
    Passion,
    Melancholy,
}

impl Emotion {
    /// All labels in canonical index order
    pub const ALL: [Emotion; EMOTION_COUNT] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Nostalgia,
        Emotion::Awe,
        Emotion::Determination,
        Emotion::Serenity,
        Emotion::Passion,
        Emotion::Melancholy,
    ];

    /// Canonical index of this label in classifier output distributions
    pub fn index(self) -> usize {
        self as usize
    }

    /// Label at a canonical index, None if out of range
    pub fn from_index(index: usize) -> Option<Emotion> {
        Emotion::ALL.get(index).copied()
    }

    /// Snake-case string form (matches serde representation)
    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Nostalgia => "nostalgia",
            Emotion::Awe => "awe",
            Emotion::Determination => "determination",
            Emotion::Serenity => "serenity",
            Emotion::Passion => "passion",
            Emotion::Melancholy => "melancholy",
        }
    }

    /// Parse from the snake-case string form
    ///
    /// Returns None for anything outside the closed set — callers turn that
    /// into their domain error (DatasetError, IncompatibleLabel, ...).
    pub fn parse(s: &str) -> Option<Emotion> {
        Emotion::ALL.iter().copied().find(|e| e.as_str() == s)
    }

    /// Valence: negative ↔ positive affect, in [-1.0, 1.0]
    pub fn valence(self) -> f32 {
        match self {
            Emotion::Joy => 0.9,
            Emotion::Sadness => -0.7,
            Emotion::Anger => -0.6,
            Emotion::Fear => -0.8,
            Emotion::Surprise => 0.2,
            Emotion::Disgust => -0.7,
            Emotion::Nostalgia => 0.1,
            Emotion::Awe => 0.7,
            Emotion::Determination => 0.5,
            Emotion::Serenity => 0.8,
            Emotion::Passion => 0.7,
            Emotion::Melancholy => -0.4,
        }
    }

    /// Arousal: calm ↔ activated, in [0.0, 1.0]
    pub fn arousal(self) -> f32 {
        match self {
            Emotion::Joy => 0.8,
            Emotion::Sadness => 0.25,
            Emotion::Anger => 0.9,
            Emotion::Fear => 0.85,
            Emotion::Surprise => 0.75,
            Emotion::Disgust => 0.5,
            Emotion::Nostalgia => 0.3,
            Emotion::Awe => 0.6,
            Emotion::Determination => 0.7,
            Emotion::Serenity => 0.15,
            Emotion::Passion => 0.85,
            Emotion::Melancholy => 0.2,
        }
    }

    /// Color tokens for rendering consumers (always non-empty)
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Emotion::Joy => &["#ffd447", "#ff9e2c", "#fff3b0"],
            Emotion::Sadness => &["#3b6ea5", "#274060", "#8da9c4"],
            Emotion::Anger => &["#c1121f", "#780000", "#ff4d4d"],
            Emotion::Fear => &["#4a2c6d", "#1b1035", "#8660b5"],
            Emotion::Surprise => &["#ff7ab6", "#ffd6e8", "#c44fa0"],
            Emotion::Disgust => &["#5c7a29", "#3a4d14", "#9aae5a"],
            Emotion::Nostalgia => &["#c9a227", "#8c6a1d", "#e8d8a6"],
            Emotion::Awe => &["#2ec4b6", "#0b7a75", "#9cf6ef"],
            Emotion::Determination => &["#e36414", "#9a3b0c", "#ffb563"],
            Emotion::Serenity => &["#a7c4bc", "#5e8b7e", "#dff3ec"],
            Emotion::Passion => &["#d90368", "#820263", "#ff5d8f"],
            Emotion::Melancholy => &["#6d6875", "#4a4453", "#b5a8c0"],
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
