//! Shared integration test helpers: synthetic labeled datasets and app
//! state construction.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sema_common::config::TrainingSection;
use sema_common::events::EventBus;
use sema_common::labels::Emotion;
use sema_engine::dataset::DatasetRecord;
use sema_engine::store::{MemoryModelStore, ModelSlot, ModelStore};
use sema_engine::types::FEATURE_ARITY;
use sema_engine::AppState;
use std::sync::Arc;

/// Deterministic cluster center for one label, well separated from the
/// others by construction
pub fn cluster_center(emotion: Emotion) -> [f32; FEATURE_ARITY] {
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

pub fn genre_for(emotion: Emotion) -> &'static str {
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
pub fn synthetic_records(per_label: usize) -> Vec<DatasetRecord> {
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

/// Training settings sized for test runtime, not accuracy
pub fn quick_training_config() -> TrainingSection {
    TrainingSection {
        seed: 42,
        epochs: 60,
        batch_size: 16,
        learning_rate: 0.1,
        hidden_width: 20,
    }
}

/// App state over an in-memory store with an empty publication slot
pub fn test_app_state() -> AppState {
    let store: Arc<dyn ModelStore> = Arc::new(MemoryModelStore::new());
    let slot = Arc::new(ModelSlot::empty());
    let event_bus = EventBus::new(100);
    AppState::new(store, slot, event_bus, quick_training_config())
}
