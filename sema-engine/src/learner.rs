//! Feedback learner: corrections, personality nudges, incremental retrain
//!
//! A user correction does two things. Immediately, it nudges the
//! personality profile by a small bounded step in the direction that would
//! have favored the corrected label, and publishes the adjusted profile as
//! a new revision. Once enough corrections accumulate, it also triggers an
//! incremental training step — few epochs, low learning rate — on a clone
//! of the current classifier, published atomically when it finishes.
//!
//! The published revision is never mutated in place: readers see either
//! the old or the new revision in full, and a failed step leaves the
//! previous revision untouched.

use crate::personality::{PersonalityDelta, PersonalityTrait};
use crate::store::{ModelArtifacts, ModelRevision, ModelSlot, ModelStore};
use crate::types::{EmotionalState, FeatureVector};
use chrono::Utc;
use sema_common::labels::Emotion;
use sema_common::params::PARAMS;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Malformed or unusable feedback — rejected per call, nothing changes
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Corrected label is outside the closed emotion set
    #[error("label {0:?} is outside the closed emotion set")]
    IncompatibleLabel(String),

    /// No model revision published to apply feedback against
    #[error("no model revision published")]
    ModelUnavailable,
}

/// Result of one accepted correction
pub struct FeedbackOutcome {
    /// Bounded per-trait adjustment applied (empty when the correction
    /// agreed with the engine)
    pub delta: PersonalityDelta,
    /// Version of the revision published by this correction (unchanged
    /// when no nudge was needed)
    pub version: i64,
    /// Handle of the incremental retrain task, when this correction
    /// tipped the batch threshold; resolves to the published version.
    /// Callers may await it or drop it to abandon the result.
    pub retrain: Option<JoinHandle<i64>>,
}

/// Accepts corrections and feeds them back into personalization
pub struct FeedbackLearner {
    slot: Arc<ModelSlot>,
    store: Arc<dyn ModelStore>,
    pending: Mutex<Vec<(FeatureVector, Emotion)>>,
}

impl FeedbackLearner {
    pub fn new(slot: Arc<ModelSlot>, store: Arc<dyn ModelStore>) -> Self {
        Self {
            slot,
            store,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Corrections waiting for the next incremental step
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Apply one user correction
    ///
    /// Rejects labels outside the closed set with `IncompatibleLabel`;
    /// the profile and the pending batch are untouched on rejection.
    pub async fn correct(
        &self,
        original: &EmotionalState,
        corrected_label: &str,
    ) -> Result<FeedbackOutcome, FeedbackError> {
        let corrected = Emotion::parse(corrected_label)
            .ok_or_else(|| FeedbackError::IncompatibleLabel(corrected_label.to_string()))?;
        let revision = self.slot.current().ok_or(FeedbackError::ModelUnavailable)?;

        let delta = if corrected == original.primary {
            // Agreement confirms the inference; it still becomes a
            // labeled example but moves no trait weights.
            PersonalityDelta::new()
        } else {
            nudge_toward(corrected)
        };

        let version = if delta.is_empty() {
            revision.version
        } else {
            let artifacts = ModelArtifacts {
                model: revision.artifacts.model.clone(),
                personality: revision.artifacts.personality.nudged(&delta),
                affinity: revision.artifacts.affinity.clone(),
                trained_at: revision.artifacts.trained_at,
            };
            self.publish(artifacts).await
        };

        debug!(
            original = %original.primary,
            corrected = %corrected,
            version,
            "Correction applied"
        );

        // Accumulate the labeled example and check the batch threshold
        let batch = {
            let mut pending = self.pending.lock().unwrap();
            pending.push((original.features, corrected));
            let min_batch = *PARAMS.feedback_min_batch.read().unwrap();
            if pending.len() >= min_batch {
                Some(std::mem::take(&mut *pending))
            } else {
                None
            }
        };

        let retrain = batch.map(|batch| self.spawn_incremental_step(batch));

        Ok(FeedbackOutcome {
            delta,
            version,
            retrain,
        })
    }

    /// Persist and publish, degrading to a locally allocated version when
    /// the store is unavailable
    ///
    /// The slot owns version monotonicity, so the version actually
    /// published (and returned here) may be higher than the one the store
    /// allocated.
    async fn publish(&self, artifacts: ModelArtifacts) -> i64 {
        let version = match self.store.put(&artifacts).await {
            Ok(version) => version,
            Err(e) => {
                warn!("Model store unavailable, publishing in memory only: {}", e);
                self.slot.version().unwrap_or(0) + 1
            }
        };
        self.slot.publish(ModelRevision { version, artifacts }).version
    }

    /// Run the incremental training step off the inference path
    ///
    /// Trains a clone of the currently published classifier; inference
    /// keeps serving the previous revision until the atomic publish at
    /// the end. Resolves to the published version.
    fn spawn_incremental_step(
        &self,
        batch: Vec<(FeatureVector, Emotion)>,
    ) -> JoinHandle<i64> {
        let slot = Arc::clone(&self.slot);
        let store = Arc::clone(&self.store);
        let epochs = *PARAMS.incremental_epochs.read().unwrap();
        let learning_rate = *PARAMS.incremental_learning_rate.read().unwrap();

        info!(batch_size = batch.len(), epochs, "Incremental retrain starting");
        tokio::spawn(async move {
            // The learner only accepts corrections against a published
            // revision, so the slot is non-empty here.
            let Some(revision) = slot.current() else {
                warn!("Incremental retrain skipped: no published revision");
                return 0;
            };

            let inputs: Vec<Vec<f32>> = batch
                .iter()
                .map(|(features, _)| features.as_slice().to_vec())
                .collect();
            let targets: Vec<usize> =
                batch.iter().map(|(_, label)| label.index()).collect();

            // Keep the runtime worker threads free for inference handlers
            let mut model = revision.artifacts.model.clone();
            let trained = tokio::task::spawn_blocking(move || {
                let order: Vec<usize> = (0..inputs.len()).collect();
                let mut final_loss = 0.0;
                for _ in 0..epochs {
                    final_loss = model.train_epoch(
                        &inputs,
                        &targets,
                        &order,
                        inputs.len(),
                        learning_rate,
                    );
                }
                (model, final_loss)
            })
            .await;
            let Ok((model, final_loss)) = trained else {
                warn!("Incremental retrain task failed, keeping current revision");
                return slot.version().unwrap_or(0);
            };

            let artifacts = ModelArtifacts {
                model,
                personality: revision.artifacts.personality.clone(),
                affinity: revision.artifacts.affinity.clone(),
                trained_at: Utc::now(),
            };

            let version = match store.put(&artifacts).await {
                Ok(version) => version,
                Err(e) => {
                    warn!("Model store unavailable after retrain: {}", e);
                    slot.version().unwrap_or(0) + 1
                }
            };
            let version = slot.publish(ModelRevision { version, artifacts }).version;
            info!(version, final_loss, "Incremental retrain published");
            version
        })
    }
}

/// Bounded trait nudge favoring the corrected label
///
/// Each trait moves by the configured step scaled by the same per-label
/// term its inference transform uses, so the nudge points in the
/// direction that would have raised the corrected label's mass.
/// Conscientiousness always softens slightly on a disagreement — the
/// engine was more decisive than it should have been.
fn nudge_toward(corrected: Emotion) -> PersonalityDelta {
    let step = *PARAMS.feedback_trait_step.read().unwrap();
    let mut delta = PersonalityDelta::new();
    delta.insert(
        PersonalityTrait::Agreeableness,
        step * corrected.valence(),
    );
    delta.insert(
        PersonalityTrait::Extraversion,
        step * (2.0 * corrected.arousal() - 1.0),
    );
    delta.insert(
        PersonalityTrait::Neuroticism,
        step * -corrected.valence(),
    );
    delta.insert(
        PersonalityTrait::Openness,
        step * (1.0 - corrected.valence().abs()),
    );
    delta.insert(PersonalityTrait::Conscientiousness, -0.5 * step);
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::MusicalAffinityTable;
    use crate::nn::MlpClassifier;
    use crate::personality::PersonalityProfile;
    use crate::store::MemoryModelStore;
    use crate::types::FEATURE_ARITY;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sema_common::labels::EMOTION_COUNT;

    fn setup() -> (Arc<ModelSlot>, FeedbackLearner) {
        let mut rng = StdRng::seed_from_u64(21);
        let slot = Arc::new(ModelSlot::empty());
        slot.publish(ModelRevision {
            version: 1,
            artifacts: ModelArtifacts {
                model: MlpClassifier::new(FEATURE_ARITY, 16, EMOTION_COUNT, &mut rng),
                personality: PersonalityProfile::neutral(),
                affinity: MusicalAffinityTable::default(),
                trained_at: Utc::now(),
            },
        });
        let store: Arc<dyn ModelStore> = Arc::new(MemoryModelStore::new());
        let learner = FeedbackLearner::new(Arc::clone(&slot), store);
        (slot, learner)
    }

    fn state(primary: Emotion) -> EmotionalState {
        EmotionalState {
            primary,
            confidence: 70.0,
            depth: 40.0,
            intensity: 0.6,
            colors: primary.colors().iter().map(|c| c.to_string()).collect(),
            features: FeatureVector::new(&[0.6; FEATURE_ARITY]).unwrap(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_incompatible_label_rejected_profile_unchanged() {
        let (slot, learner) = setup();
        let before = slot.current().unwrap();

        let result = learner.correct(&state(Emotion::Joy), "unknown_emotion").await;
        match result {
            Err(FeedbackError::IncompatibleLabel(label)) => {
                assert_eq!(label, "unknown_emotion")
            }
            _ => panic!("expected IncompatibleLabel"),
        }

        let after = slot.current().unwrap();
        assert_eq!(after.version, before.version);
        assert_eq!(
            after.artifacts.personality, before.artifacts.personality,
            "profile must be untouched on rejection"
        );
        assert_eq!(learner.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_agreement_moves_no_weights() {
        let (slot, learner) = setup();
        let outcome = learner.correct(&state(Emotion::Joy), "joy").await.unwrap();
        assert!(outcome.delta.is_empty());
        assert_eq!(outcome.version, 1);
        assert_eq!(slot.version(), Some(1));
        // The confirming example still counts toward the batch
        assert_eq!(learner.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_disagreement_publishes_nudged_profile() {
        let (slot, learner) = setup();
        let before = slot.current().unwrap();
        let outcome = learner
            .correct(&state(Emotion::Joy), "melancholy")
            .await
            .unwrap();
        assert!(!outcome.delta.is_empty());
        assert!(outcome.version > 1);

        let published = slot.current().unwrap();
        assert_eq!(published.version, outcome.version);
        let profile = &published.artifacts.personality;
        // Melancholy is negative-valence: agreeableness down, neuroticism up
        assert!(profile.weight(PersonalityTrait::Agreeableness) < 0.5);
        assert!(profile.weight(PersonalityTrait::Neuroticism) > 0.5);
        // Model weights are untouched by the profile nudge
        assert_eq!(published.artifacts.model, before.artifacts.model);
    }

    #[tokio::test]
    async fn test_correction_version_rises_past_unpersisted_revision() {
        // The published revision never went through the store (restart
        // with a stale database, degraded trainer), so the store's next
        // allocation lags the slot
        let mut rng = StdRng::seed_from_u64(21);
        let slot = Arc::new(ModelSlot::empty());
        slot.publish(ModelRevision {
            version: 5,
            artifacts: ModelArtifacts {
                model: MlpClassifier::new(FEATURE_ARITY, 16, EMOTION_COUNT, &mut rng),
                personality: PersonalityProfile::neutral(),
                affinity: MusicalAffinityTable::default(),
                trained_at: Utc::now(),
            },
        });
        let store: Arc<dyn ModelStore> = Arc::new(MemoryModelStore::new());
        let learner = FeedbackLearner::new(Arc::clone(&slot), store);

        let outcome = learner
            .correct(&state(Emotion::Joy), "melancholy")
            .await
            .unwrap();
        assert!(outcome.version > 5, "published version regressed: {}", outcome.version);
        assert_eq!(slot.version(), Some(outcome.version));
    }

    #[tokio::test]
    async fn test_batch_threshold_triggers_incremental_retrain() {
        let (slot, learner) = setup();
        let min_batch = *PARAMS.feedback_min_batch.read().unwrap();

        let mut last = None;
        for i in 0..min_batch {
            let outcome = learner
                .correct(&state(Emotion::Joy), "serenity")
                .await
                .unwrap();
            if i + 1 < min_batch {
                assert!(outcome.retrain.is_none());
            }
            last = Some(outcome);
        }

        let retrain = last.unwrap().retrain.expect("batch threshold must trigger retrain");
        let version_before = slot.version().unwrap();
        let published = retrain.await.unwrap();
        assert!(published > version_before);
        assert_eq!(slot.version(), Some(published));
        assert_eq!(learner.pending_count(), 0, "batch must be drained");
    }

    #[tokio::test]
    async fn test_nudge_is_bounded_under_repetition() {
        let (slot, learner) = setup();
        // Hammer the same correction far past any reasonable drift
        for _ in 0..200 {
            learner
                .correct(&state(Emotion::Joy), "fear")
                .await
                .unwrap();
        }
        let profile = slot.current().unwrap().artifacts.personality.clone();
        for personality_trait in PersonalityTrait::ALL {
            let w = profile.weight(personality_trait);
            assert!((0.0..=1.0).contains(&w), "{} drifted to {}", personality_trait, w);
        }
    }
}
