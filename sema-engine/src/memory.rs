//! Emotional memory: experience log and emotional DNA
//!
//! An append-only, time-ordered log of inference results with derived
//! aggregate statistics. The log is bounded — oldest entries are evicted
//! FIFO past capacity, because `insights()` recomputes over the whole log
//! on demand and unbounded growth is a correctness issue, not just a
//! performance one.
//!
//! One writer, many readers: `record` takes the write lock briefly,
//! `insights`/`recent_journey` read a consistent snapshot. Readers see
//! either the pre- or post-append log, never a partially appended entry.

use crate::types::{EmotionalDna, EmotionalState, Experience, ExperienceContext};
use sema_common::labels::{Emotion, EMOTION_COUNT};
use sema_common::params::PARAMS;
use std::collections::{BTreeMap, VecDeque};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Bounded experience log with on-demand aggregation
pub struct EmotionalMemory {
    inner: RwLock<Inner>,
}

struct Inner {
    entries: VecDeque<Experience>,
    capacity: usize,
}

impl EmotionalMemory {
    /// Capacity from the global parameters
    pub fn new() -> Self {
        Self::with_capacity(*PARAMS.memory_capacity.read().unwrap())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Append one experience; never rejects a well-formed state
    ///
    /// The emotional weight combines confidence and intensity — each
    /// increases it monotonically — and is floored at the configured
    /// minimum so a zero-signal state still carries defined weight.
    pub fn record(&self, state: EmotionalState, context: ExperienceContext) -> Experience {
        let floor = *PARAMS.min_emotional_weight.read().unwrap();
        let emotional_weight =
            (0.3 * (state.confidence / 100.0) + 0.7 * state.intensity).clamp(floor, 1.0);

        let experience = Experience {
            id: Uuid::new_v4(),
            state,
            context,
            emotional_weight,
        };

        let mut inner = self.inner.write().unwrap();
        if inner.entries.len() >= inner.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(experience.clone());
        debug!(
            emotional_weight,
            log_len = inner.entries.len(),
            "Experience recorded"
        );
        experience
    }

    /// The `n` most recent experiences, most recent first
    pub fn recent_journey(&self, n: usize) -> Vec<Experience> {
        let inner = self.inner.read().unwrap();
        inner.entries.iter().rev().take(n).cloned().collect()
    }

    /// Look up one experience by id, if it is still in the log
    pub fn find(&self, id: Uuid) -> Option<Experience> {
        let inner = self.inner.read().unwrap();
        inner.entries.iter().find(|e| e.id == id).cloned()
    }

    /// Number of experiences currently held
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute the emotional DNA from the current log
    ///
    /// Pure function of the log snapshot: two calls with no intervening
    /// `record` return identical output.
    pub fn insights(&self) -> EmotionalDna {
        let inner = self.inner.read().unwrap();
        if inner.entries.is_empty() {
            return EmotionalDna::empty();
        }

        // Weighted label frequencies
        let mut weights = [0.0f32; EMOTION_COUNT];
        let mut time_patterns: BTreeMap<u32, BTreeMap<Emotion, u32>> = BTreeMap::new();
        for experience in &inner.entries {
            let label = experience.state.primary;
            weights[label.index()] += experience.emotional_weight;

            use chrono::Timelike;
            let hour = experience.state.timestamp.hour();
            *time_patterns
                .entry(hour)
                .or_default()
                .entry(label)
                .or_insert(0) += 1;
        }

        let total: f32 = weights.iter().sum();
        let mut ranked: Vec<(Emotion, f32)> = Emotion::ALL
            .iter()
            .filter_map(|&emotion| {
                let w = weights[emotion.index()];
                (w > 0.0).then(|| (emotion, w / total))
            })
            .collect();
        // Weight descending, canonical label order on ties (deterministic)
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.index().cmp(&b.0.index()))
        });
        let top_k = *PARAMS.dominant_emotion_count.read().unwrap();
        ranked.truncate(top_k);

        // Normalized entropy of the weighted label distribution
        let emotional_complexity = {
            let entropy: f32 = weights
                .iter()
                .filter(|&&w| w > 0.0)
                .map(|&w| {
                    let p = w / total;
                    -p * p.ln()
                })
                .sum();
            (entropy / (EMOTION_COUNT as f32).ln()).clamp(0.0, 1.0)
        };

        EmotionalDna {
            dominant_emotions: ranked,
            emotional_complexity,
            time_patterns,
        }
    }
}

impl Default for EmotionalMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeatureVector;
    use chrono::TimeZone;

    fn state(primary: Emotion, confidence: f32, intensity: f32, hour: u32) -> EmotionalState {
        EmotionalState {
            primary,
            confidence,
            depth: 50.0,
            intensity,
            colors: primary.colors().iter().map(|c| c.to_string()).collect(),
            features: FeatureVector::new(&[intensity; 8]).unwrap(),
            timestamp: chrono::Utc
                .with_ymd_and_hms(2026, 8, 28, hour, 30, 0)
                .unwrap(),
        }
    }

    fn context() -> ExperienceContext {
        ExperienceContext::new("test", 12.0)
    }

    #[test]
    fn test_bounded_fifo_eviction() {
        let memory = EmotionalMemory::with_capacity(3);
        let first = memory.record(state(Emotion::Joy, 80.0, 0.8, 10), context());
        for _ in 0..3 {
            memory.record(state(Emotion::Sadness, 60.0, 0.4, 11), context());
        }
        assert_eq!(memory.len(), 3, "log must never exceed capacity");

        let journey = memory.recent_journey(10);
        assert!(
            journey.iter().all(|e| e.id != first.id),
            "oldest entry must be the one evicted"
        );
    }

    #[test]
    fn test_recent_journey_is_most_recent_first() {
        let memory = EmotionalMemory::with_capacity(10);
        memory.record(state(Emotion::Joy, 80.0, 0.8, 10), context());
        let last = memory.record(state(Emotion::Awe, 70.0, 0.6, 11), context());

        let journey = memory.recent_journey(2);
        assert_eq!(journey.len(), 2);
        assert_eq!(journey[0].id, last.id);
        assert_eq!(journey[1].state.primary, Emotion::Joy);
    }

    #[test]
    fn test_zero_signal_state_gets_minimum_weight() {
        let memory = EmotionalMemory::with_capacity(10);
        let experience = memory.record(state(Emotion::Melancholy, 0.0, 0.0, 3), context());
        let floor = *PARAMS.min_emotional_weight.read().unwrap();
        assert_eq!(experience.emotional_weight, floor);
        assert!(experience.emotional_weight.is_finite());
        assert!(experience.emotional_weight > 0.0);
    }

    #[test]
    fn test_weight_increases_with_confidence_and_intensity() {
        let memory = EmotionalMemory::with_capacity(10);
        let low = memory.record(state(Emotion::Joy, 20.0, 0.2, 9), context());
        let more_confident = memory.record(state(Emotion::Joy, 90.0, 0.2, 9), context());
        let more_intense = memory.record(state(Emotion::Joy, 20.0, 0.9, 9), context());

        assert!(more_confident.emotional_weight > low.emotional_weight);
        assert!(more_intense.emotional_weight > low.emotional_weight);
    }

    #[test]
    fn test_insights_is_idempotent() {
        let memory = EmotionalMemory::with_capacity(10);
        memory.record(state(Emotion::Joy, 80.0, 0.8, 10), context());
        memory.record(state(Emotion::Nostalgia, 65.0, 0.5, 22), context());

        let a = memory.insights();
        let b = memory.insights();
        assert_eq!(a, b, "insights must be a pure function of the log");
    }

    #[test]
    fn test_insights_ranks_by_weighted_frequency() {
        let memory = EmotionalMemory::with_capacity(20);
        for _ in 0..5 {
            memory.record(state(Emotion::Serenity, 90.0, 0.9, 8), context());
        }
        memory.record(state(Emotion::Anger, 50.0, 0.3, 8), context());

        let dna = memory.insights();
        assert_eq!(dna.dominant_emotions[0].0, Emotion::Serenity);
        assert!(dna.emotional_complexity > 0.0);
        assert!(dna.emotional_complexity < 1.0);

        // Hour bucket 8 saw both labels
        let bucket = &dna.time_patterns[&8];
        assert_eq!(bucket[&Emotion::Serenity], 5);
        assert_eq!(bucket[&Emotion::Anger], 1);
    }

    #[test]
    fn test_empty_log_yields_empty_dna() {
        let memory = EmotionalMemory::with_capacity(5);
        assert_eq!(memory.insights(), EmotionalDna::empty());
    }
}
