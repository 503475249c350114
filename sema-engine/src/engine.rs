//! Emotion inference engine
//!
//! Turns one feature vector into one `EmotionalState` by passing the raw
//! classifier distribution through a fixed pipeline:
//!
//! 1. baseline classifier → raw distribution over labels
//! 2. personality bias (every trait applies its declared transform)
//! 3. optional genre affinity blend, weighted by the genre's base affinity
//! 4. optional memory nudge toward recent dominant emotions, capped at a
//!    fixed fraction of the final mass so history never overrides the
//!    current signal
//! 5. arg-max → primary, confidence, entropy depth, intensity, colors
//!
//! Inference is pure and non-blocking: it clones an `Arc` to the published
//! revision and computes. Given identical inputs and the same revision the
//! distribution is bit-reproducible — no unseeded randomness anywhere.

use crate::store::{ModelRevision, ModelSlot};
use crate::types::{EmotionalDna, EmotionalState, FeatureError, FeatureVector};
use chrono::Utc;
use sema_common::labels::{Emotion, EMOTION_COUNT};
use sema_common::params::PARAMS;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Malformed inference input or missing model — both recoverable per
/// call, the engine stays usable afterwards
#[derive(Debug, Error)]
pub enum InferError {
    /// Feature arity/finiteness violation
    #[error("invalid feature input: {0}")]
    InvalidFeature(#[from] FeatureError),

    /// No model revision has been published yet
    #[error("no model revision published")]
    ModelUnavailable,
}

/// The inference engine
///
/// Holds a reference to the publication slot, not to any one revision:
/// an engine configured this way tracks "latest" and observes each newly
/// published revision on its next call, never a mixture.
pub struct EmotionEngine {
    slot: Arc<ModelSlot>,
}

impl EmotionEngine {
    pub fn new(slot: Arc<ModelSlot>) -> Self {
        Self { slot }
    }

    /// Version of the revision inference currently runs against
    pub fn model_version(&self) -> Option<i64> {
        self.slot.version()
    }

    /// Infer an emotional state from one analysis window
    pub fn infer(
        &self,
        features: &[f32],
        genre_hint: Option<&str>,
        memory_context: Option<&EmotionalDna>,
    ) -> Result<EmotionalState, InferError> {
        let features = FeatureVector::new(features)?;
        let revision = self.slot.current().ok_or(InferError::ModelUnavailable)?;

        let distribution =
            compute_distribution(&revision, &features, genre_hint, memory_context);

        // Stable arg-max: ties resolve to the earlier label in canonical order
        let mut primary = Emotion::ALL[0];
        let mut best = distribution[0];
        for emotion in Emotion::ALL {
            let p = distribution[emotion.index()];
            if p > best {
                best = p;
                primary = emotion;
            }
        }

        let confidence = (best * 100.0).clamp(0.0, 100.0);
        let depth = (entropy(&distribution) / (EMOTION_COUNT as f32).ln() * 100.0)
            .clamp(0.0, 100.0);
        let intensity = features.energy();

        debug!(
            primary = %primary,
            confidence,
            depth,
            model_version = revision.version,
            "Inference complete"
        );

        Ok(EmotionalState {
            primary,
            confidence,
            depth,
            intensity,
            colors: primary.colors().iter().map(|c| c.to_string()).collect(),
            features,
            timestamp: Utc::now(),
        })
    }
}

/// Run the full bias pipeline; exposed at crate level so tests can check
/// the distribution-level invariants arg-max hides
pub(crate) fn compute_distribution(
    revision: &ModelRevision,
    features: &FeatureVector,
    genre_hint: Option<&str>,
    memory_context: Option<&EmotionalDna>,
) -> [f32; EMOTION_COUNT] {
    let artifacts = &revision.artifacts;

    // Step 1: raw classifier output
    let raw = artifacts.model.predict(features.as_slice());
    let mut distribution = [0.0f32; EMOTION_COUNT];
    distribution.copy_from_slice(&raw);

    // Step 2: personality bias
    let trait_scale = *PARAMS.trait_bias_scale.read().unwrap();
    artifacts.personality.apply_bias(&mut distribution, trait_scale);

    // Step 3: genre affinity blend — optional, absent or unknown genres
    // are skipped, never an error
    if let Some(genre) = genre_hint {
        if let Some((base_affinity, response)) =
            artifacts.affinity.response_distribution(genre)
        {
            let blend_scale = *PARAMS.genre_blend_scale.read().unwrap();
            let weight = (base_affinity * blend_scale).clamp(0.0, 1.0);
            for (p, r) in distribution.iter_mut().zip(&response) {
                *p = (1.0 - weight) * *p + weight * r;
            }
            renormalize(&mut distribution);
        }
    }

    // Step 4: bounded memory nudge
    if let Some(dna) = memory_context {
        if !dna.dominant_emotions.is_empty() {
            let rank_decay = *PARAMS.memory_rank_decay.read().unwrap();
            let cap = *PARAMS.memory_influence_cap.read().unwrap();

            let mut memory_dist = [0.0f32; EMOTION_COUNT];
            let mut decay = 1.0f32;
            for (emotion, _) in &dna.dominant_emotions {
                memory_dist[emotion.index()] += decay;
                decay *= rank_decay;
            }
            renormalize(&mut memory_dist);

            for (p, m) in distribution.iter_mut().zip(&memory_dist) {
                *p = (1.0 - cap) * *p + cap * m;
            }
            renormalize(&mut distribution);
        }
    }

    distribution
}

fn renormalize(distribution: &mut [f32; EMOTION_COUNT]) {
    let sum: f32 = distribution.iter().sum();
    if sum > 0.0 {
        for p in distribution.iter_mut() {
            *p /= sum;
        }
    }
}

fn entropy(distribution: &[f32; EMOTION_COUNT]) -> f32 {
    -distribution
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.ln())
        .sum::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::MusicalAffinityTable;
    use crate::nn::MlpClassifier;
    use crate::personality::PersonalityProfile;
    use crate::store::ModelArtifacts;
    use crate::types::FEATURE_ARITY;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn untrained_revision(version: i64) -> ModelRevision {
        let mut rng = StdRng::seed_from_u64(11);
        ModelRevision {
            version,
            artifacts: ModelArtifacts {
                model: MlpClassifier::new(FEATURE_ARITY, 16, EMOTION_COUNT, &mut rng),
                personality: PersonalityProfile::neutral(),
                affinity: MusicalAffinityTable::derive([
                    ("metal", Emotion::Anger),
                    ("metal", Emotion::Anger),
                    ("metal", Emotion::Fear),
                ]),
                trained_at: Utc::now(),
            },
        }
    }

    fn engine_with_model() -> EmotionEngine {
        let slot = Arc::new(ModelSlot::empty());
        slot.publish(untrained_revision(1));
        EmotionEngine::new(slot)
    }

    #[test]
    fn test_no_model_is_recoverable() {
        let slot = Arc::new(ModelSlot::empty());
        let engine = EmotionEngine::new(Arc::clone(&slot));
        let features = [0.5f32; FEATURE_ARITY];

        assert!(matches!(
            engine.infer(&features, None, None),
            Err(InferError::ModelUnavailable)
        ));

        // Publishing makes the same engine usable
        slot.publish(untrained_revision(1));
        assert!(engine.infer(&features, None, None).is_ok());
    }

    #[test]
    fn test_invalid_arity_is_recoverable() {
        let engine = engine_with_model();
        assert!(matches!(
            engine.infer(&[0.5; 3], None, None),
            Err(InferError::InvalidFeature(FeatureError::Arity { actual: 3 }))
        ));
        assert!(engine.infer(&[0.5; FEATURE_ARITY], None, None).is_ok());
    }

    #[test]
    fn test_state_invariants() {
        let engine = engine_with_model();
        let state = engine.infer(&[0.7; FEATURE_ARITY], None, None).unwrap();
        assert!((0.0..=100.0).contains(&state.confidence));
        assert!((0.0..=100.0).contains(&state.depth));
        assert!((0.0..=1.0).contains(&state.intensity));
        assert!(!state.colors.is_empty());
        assert_eq!(state.intensity, 0.7);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let engine = engine_with_model();
        let features = [0.3f32, 0.9, 0.1, 0.6, 0.2, 0.8, 0.4, 0.5];
        let a = engine.infer(&features, Some("metal"), None).unwrap();
        let b = engine.infer(&features, Some("metal"), None).unwrap();
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.depth, b.depth);
    }

    #[test]
    fn test_genre_hint_shifts_toward_genre_response() {
        let revision = untrained_revision(1);
        let features = FeatureVector::new(&[0.5; FEATURE_ARITY]).unwrap();

        let plain = compute_distribution(&revision, &features, None, None);
        let hinted = compute_distribution(&revision, &features, Some("metal"), None);
        assert!(
            hinted[Emotion::Anger.index()] > plain[Emotion::Anger.index()],
            "metal hint should raise anger mass"
        );

        // Unknown genre is skipped, not an error
        let unknown = compute_distribution(&revision, &features, Some("zydeco"), None);
        assert_eq!(plain, unknown);
    }

    #[test]
    fn test_memory_nudge_is_bounded() {
        let revision = untrained_revision(1);
        let features = FeatureVector::new(&[0.5; FEATURE_ARITY]).unwrap();

        let mut dna = EmotionalDna::empty();
        dna.dominant_emotions = vec![(Emotion::Anger, 1.0)];

        let plain = compute_distribution(&revision, &features, None, None);
        let nudged = compute_distribution(&revision, &features, None, Some(&dna));

        let cap = *PARAMS.memory_influence_cap.read().unwrap();
        let anger = Emotion::Anger.index();
        let expected_max = (1.0 - cap) * plain[anger] + cap + 1e-4;
        assert!(
            nudged[anger] <= expected_max,
            "memory moved anger to {} (cap {})",
            nudged[anger],
            cap
        );
        // The nudge does move mass toward the dominant emotion
        assert!(nudged[anger] > plain[anger]);

        // Empty DNA is a no-op
        let empty = compute_distribution(&revision, &features, None, Some(&EmotionalDna::empty()));
        assert_eq!(plain, empty);
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let revision = untrained_revision(1);
        let features = FeatureVector::new(&[0.9, 0.9, 0.7, 0.4, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let mut dna = EmotionalDna::empty();
        dna.dominant_emotions = vec![(Emotion::Serenity, 0.8), (Emotion::Joy, 0.2)];

        let dist = compute_distribution(&revision, &features, Some("metal"), Some(&dna));
        let sum: f32 = dist.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "sum {}", sum);
    }
}
