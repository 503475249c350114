//! Baseline trainer ("factory soul")
//!
//! Trains the baseline classifier from a small labeled feature dataset and
//! derives the two personalization artifacts alongside it: the personality
//! profile (from dataset-wide label frequencies) and the musical affinity
//! table (from genre × label co-occurrence).
//!
//! Reproducibility over marginal accuracy: shuffling is seeded, the epoch
//! budget is fixed rather than adaptive, and two runs on identical input
//! with the same seed produce identical weights.

use crate::dataset::{self, DatasetError, DatasetRecord};
use crate::affinity::MusicalAffinityTable;
use crate::nn::MlpClassifier;
use crate::personality::PersonalityProfile;
use crate::store::{ModelArtifacts, ModelRevision, ModelStore};
use crate::types::FEATURE_ARITY;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sema_common::config::TrainingSection;
use sema_common::labels::EMOTION_COUNT;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Trailing-window length for convergence detection
const CONVERGENCE_WINDOW: usize = 10;

/// A training run that produced no result
#[derive(Debug, Error)]
pub enum TrainError {
    /// The dataset was rejected; nothing trained
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The epoch loop's blocking task died (panic or runtime shutdown)
    #[error("training task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Non-fatal: the loss failed to improve over the trailing window
///
/// Training still completes and the last weights are used; the warning is
/// carried in the output and logged, never raised as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceWarning {
    /// Trailing window length in epochs
    pub window: usize,
    /// Best epoch loss seen before the window
    pub best_loss: f32,
    /// Final epoch loss
    pub final_loss: f32,
}

impl std::fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "loss did not improve over the last {} epochs (best {:.4}, final {:.4})",
            self.window, self.best_loss, self.final_loss
        )
    }
}

/// Result of one training run
///
/// Always returned to the caller, even when persistence failed —
/// `version` is None in that degraded case and the caller assigns a local
/// version at publication time.
#[derive(Debug)]
pub struct TrainingOutput {
    /// The trained artifact bundle
    pub artifacts: ModelArtifacts,
    /// Store-allocated version; None when persistence failed
    pub version: Option<i64>,
    /// Final epoch loss
    pub final_loss: f32,
    /// Set when the loss stalled over the trailing window
    pub convergence: Option<ConvergenceWarning>,
}

impl TrainingOutput {
    /// Bundle into a publishable revision, supplying a fallback version
    /// for the unpersisted case
    pub fn into_revision(self, fallback_version: i64) -> ModelRevision {
        ModelRevision {
            version: self.version.unwrap_or(fallback_version),
            artifacts: self.artifacts,
        }
    }
}

/// Trains the baseline classifier and derives personalization artifacts
pub struct BaselineTrainer {
    config: TrainingSection,
}

impl BaselineTrainer {
    pub fn new(config: TrainingSection) -> Self {
        Self { config }
    }

    /// Train from a labeled dataset and persist the artifacts
    ///
    /// Validation is all-or-nothing: any malformed record aborts with a
    /// `DatasetError` naming it, and nothing is persisted or published.
    /// A persistence failure after successful training degrades to an
    /// in-memory result (`version: None`) rather than discarding it.
    pub async fn train(
        &self,
        records: &[DatasetRecord],
        store: &dyn ModelStore,
    ) -> Result<TrainingOutput, TrainError> {
        let validated = dataset::validate(records)?;
        info!(
            record_count = validated.len(),
            seed = self.config.seed,
            epochs = self.config.epochs,
            "Starting baseline training"
        );

        // Dataset-wide label frequencies feed the personality heuristics
        let mut frequencies = [0.0f32; EMOTION_COUNT];
        for record in &validated {
            frequencies[record.label.index()] += 1.0;
        }
        for f in frequencies.iter_mut() {
            *f /= validated.len() as f32;
        }
        let personality = PersonalityProfile::derive(&frequencies);

        let affinity = MusicalAffinityTable::derive(
            validated
                .iter()
                .filter_map(|r| r.genre.as_deref().map(|g| (g, r.label))),
        );

        let inputs: Vec<Vec<f32>> = validated
            .iter()
            .map(|r| r.features.as_slice().to_vec())
            .collect();
        let targets: Vec<usize> = validated.iter().map(|r| r.label.index()).collect();

        // The epoch loop is seconds of pure CPU; run it off the async
        // worker threads so inference stays responsive
        let config = self.config.clone();
        let (model, losses) = tokio::task::spawn_blocking(move || {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut model =
                MlpClassifier::new(FEATURE_ARITY, config.hidden_width, EMOTION_COUNT, &mut rng);

            let mut order: Vec<usize> = (0..inputs.len()).collect();
            let mut losses: Vec<f32> = Vec::with_capacity(config.epochs);
            for epoch in 0..config.epochs {
                order.shuffle(&mut rng);
                let loss = model.train_epoch(
                    &inputs,
                    &targets,
                    &order,
                    config.batch_size,
                    config.learning_rate,
                );
                losses.push(loss);
                if epoch % 20 == 0 {
                    debug!(epoch, loss, "Training progress");
                }
            }
            (model, losses)
        })
        .await?;

        let final_loss = losses.last().copied().unwrap_or(0.0);
        let convergence = detect_stall(&losses);
        if let Some(warning) = &convergence {
            warn!("Convergence warning: {}", warning);
        }

        let artifacts = ModelArtifacts {
            model,
            personality,
            affinity,
            trained_at: Utc::now(),
        };

        // Persistence failure degrades to in-memory-only; the trained
        // result is still returned to the caller.
        let version = match store.put(&artifacts).await {
            Ok(version) => {
                info!(version, final_loss, "Baseline training complete");
                Some(version)
            }
            Err(e) => {
                warn!("Model store unavailable, keeping result in memory: {}", e);
                None
            }
        };

        Ok(TrainingOutput {
            artifacts,
            version,
            final_loss,
            convergence,
        })
    }
}

/// Warning when the best loss inside the trailing window never beat the
/// best loss before it
fn detect_stall(losses: &[f32]) -> Option<ConvergenceWarning> {
    if losses.len() <= CONVERGENCE_WINDOW {
        return None;
    }
    let split = losses.len() - CONVERGENCE_WINDOW;
    let best_before = losses[..split].iter().cloned().fold(f32::INFINITY, f32::min);
    let best_tail = losses[split..].iter().cloned().fold(f32::INFINITY, f32::min);
    if best_tail >= best_before {
        Some(ConvergenceWarning {
            window: CONVERGENCE_WINDOW,
            best_loss: best_before,
            final_loss: *losses.last().unwrap(),
        })
    } else {
        None
    }
}
