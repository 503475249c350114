//! Global parameter management
//!
//! Centralized singleton for the engine's tunable constants. The inference
//! bias magnitudes, memory bounds, and feedback step sizes are deliberately
//! parameters rather than hardcoded values: they shape behavior but are not
//! behavioral contracts.
//!
//! Read-frequently, write-rarely access pattern using RwLock: readers don't
//! block each other, writes happen at startup or from the settings surface.
//!
//! # Usage
//!
//! ```rust
//! use sema_common::params::PARAMS;
//!
//! // Read (fast, uncontended)
//! let cap = *PARAMS.memory_capacity.read().unwrap();
//!
//! // Write (rare, initialization only)
//! *PARAMS.memory_capacity.write().unwrap() = 500;
//! ```

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// Global parameters singleton
///
/// Initialized with defaults, optionally overridden from TOML config at
/// startup, accessed everywhere.
pub static PARAMS: Lazy<GlobalParams> = Lazy::new(GlobalParams::default);

/// Global parameter storage
pub struct GlobalParams {
    /// Emotional memory log capacity (entries)
    ///
    /// Valid range: [1, 100000]
    /// Default: 200
    /// Oldest experiences are evicted FIFO beyond this bound.
    pub memory_capacity: RwLock<usize>,

    /// Maximum fraction of final probability mass the memory context may
    /// contribute during inference
    ///
    /// Valid range: [0.0, 0.5]
    /// Default: 0.30
    /// Keeps accumulated history from ever overriding the current signal.
    pub memory_influence_cap: RwLock<f32>,

    /// Per-rank decay applied to dominant emotions when building the
    /// memory-context distribution (rank 0 = most dominant)
    ///
    /// Valid range: (0.0, 1.0)
    /// Default: 0.5
    pub memory_rank_decay: RwLock<f32>,

    /// Scale of the personality trait transforms on the raw distribution
    ///
    /// Valid range: [0.0, 1.0]
    /// Default: 0.3
    /// At 0.0 every trait transform degenerates to identity.
    pub trait_bias_scale: RwLock<f32>,

    /// Scale applied to a genre's base affinity when blending its
    /// emotional response into the distribution
    ///
    /// Valid range: [0.0, 1.0]
    /// Default: 0.5
    pub genre_blend_scale: RwLock<f32>,

    /// Number of dominant emotions reported in EmotionalDna
    ///
    /// Valid range: [1, 12]
    /// Default: 3
    pub dominant_emotion_count: RwLock<usize>,

    /// Minimum emotional weight assigned to any recorded experience
    ///
    /// Valid range: [0.0, 1.0]
    /// Default: 0.05
    /// A zero-confidence, zero-intensity state still lands at this floor.
    pub min_emotional_weight: RwLock<f32>,

    /// Per-trait step applied by a single feedback correction
    ///
    /// Valid range: [0.0, 0.2]
    /// Default: 0.05
    /// Bounded to avoid runaway personality drift.
    pub feedback_trait_step: RwLock<f32>,

    /// Corrections accumulated before an incremental retrain is triggered
    ///
    /// Valid range: [1, 1000]
    /// Default: 5
    pub feedback_min_batch: RwLock<usize>,

    /// Epoch budget of the incremental retrain step
    ///
    /// Valid range: [1, 100]
    /// Default: 5
    pub incremental_epochs: RwLock<usize>,

    /// Learning rate of the incremental retrain step
    ///
    /// Valid range: (0.0, 1.0]
    /// Default: 0.01
    /// Deliberately low: corrections refine, they don't re-carve, the
    /// decision boundary.
    pub incremental_learning_rate: RwLock<f32>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            memory_capacity: RwLock::new(200),
            memory_influence_cap: RwLock::new(0.30),
            memory_rank_decay: RwLock::new(0.5),
            trait_bias_scale: RwLock::new(0.3),
            genre_blend_scale: RwLock::new(0.5),
            dominant_emotion_count: RwLock::new(3),
            min_emotional_weight: RwLock::new(0.05),
            feedback_trait_step: RwLock::new(0.05),
            feedback_min_batch: RwLock::new(5),
            incremental_epochs: RwLock::new(5),
            incremental_learning_rate: RwLock::new(0.01),
        }
    }
}
