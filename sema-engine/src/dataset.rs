//! Training dataset records and whole-run validation
//!
//! Validation is all-or-nothing: one malformed record aborts the entire
//! training run with a `DatasetError` naming the offending row. Silently
//! skipping bad rows is not an option — a corrupted label set corrupts the
//! decision boundary permanently.

use crate::types::{FeatureError, FeatureVector};
use sema_common::labels::Emotion;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One labeled dataset record as supplied by the external loader
///
/// The loader's file format is a collaborator concern; the core only
/// validates arity and label-set membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Audio feature descriptors (must match the agreed arity)
    pub features: Vec<f32>,
    /// Emotion label in snake-case string form
    pub label: String,
    /// Optional musical genre for affinity derivation
    #[serde(default)]
    pub genre: Option<String>,
}

/// Malformed or invalid training input — fatal to the training run
#[derive(Debug, Error)]
pub enum DatasetError {
    /// No records at all
    #[error("dataset is empty")]
    Empty,

    /// A record's feature vector failed arity/finiteness validation
    #[error("record {record}: {source}")]
    Feature {
        /// Zero-based index of the offending record
        record: usize,
        #[source]
        source: FeatureError,
    },

    /// A record's label is outside the closed emotion set
    #[error("record {record}: unknown label {label:?}")]
    UnknownLabel {
        /// Zero-based index of the offending record
        record: usize,
        /// The rejected label text
        label: String,
    },
}

/// A record that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    pub features: FeatureVector,
    pub label: Emotion,
    pub genre: Option<String>,
}

/// Validate every record, aborting on the first violation
pub fn validate(records: &[DatasetRecord]) -> Result<Vec<ValidatedRecord>, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::Empty);
    }

    records
        .iter()
        .enumerate()
        .map(|(record, raw)| {
            let features = FeatureVector::new(&raw.features)
                .map_err(|source| DatasetError::Feature { record, source })?;
            let label = Emotion::parse(&raw.label).ok_or_else(|| DatasetError::UnknownLabel {
                record,
                label: raw.label.clone(),
            })?;
            Ok(ValidatedRecord {
                features,
                label,
                genre: raw.genre.clone(),
            })
        })
        .collect()
}
