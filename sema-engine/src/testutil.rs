//! Shared test fixtures: a synthetic labeled feature dataset
//!
//! Each emotion label gets a well-separated cluster center derived from
//! its valence/arousal metadata, so a correctly implemented trainer can
//! separate the clusters and tests can probe known points.

use crate::dataset::DatasetRecord;
use crate::types::FEATURE_ARITY;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sema_common::labels::Emotion;

/// Deterministic cluster center for one label
pub(crate) fn cluster_center(emotion: Emotion) -> [f32; FEATURE_ARITY] {
    let arousal = emotion.arousal();
    let positivity = (emotion.valence() + 1.0) / 2.0;
    let index = emotion.index() as f32;
    [
        arousal,
        positivity,
        0.3 + 0.4 * arousal,
        0.3 + 0.2 * positivity,
        0.5 * emotion.valence().abs() * (1.0 - arousal),
        0.3 * (1.0 - arousal),
        0.2 * index / 11.0,
        0.1 * ((emotion.index() * 5) % 12) as f32 / 11.0,
    ]
}

/// Genre assignment used for affinity derivation in tests
pub(crate) fn genre_for(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Joy | Emotion::Passion | Emotion::Surprise => "pop",
        Emotion::Anger | Emotion::Fear | Emotion::Disgust => "metal",
        Emotion::Sadness | Emotion::Melancholy | Emotion::Serenity | Emotion::Nostalgia => {
            "ambient"
        }
        Emotion::Awe | Emotion::Determination => "cinematic",
    }
}

/// `per_label` jittered samples around every label's cluster center
pub(crate) fn synthetic_records(per_label: usize) -> Vec<DatasetRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut records = Vec::with_capacity(per_label * Emotion::ALL.len());
    for emotion in Emotion::ALL {
        let center = cluster_center(emotion);
        for _ in 0..per_label {
            let features: Vec<f32> = center
                .iter()
                .map(|&c| (c + rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0))
                .collect();
            records.push(DatasetRecord {
                features,
                label: emotion.as_str().to_string(),
                genre: Some(genre_for(emotion).to_string()),
            });
        }
    }
    records
}
