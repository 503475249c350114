//! Versioned model artifact storage and revision publication
//!
//! A training run produces one `ModelArtifacts` bundle (classifier +
//! personality profile + affinity table). The store persists bundles under
//! opaque monotonically increasing versions and never overwrites a previous
//! version in place. "Latest" is always resolvable.
//!
//! Publication is separate from persistence: the `ModelSlot` holds the
//! currently published revision behind an atomic swap, so concurrent
//! inference never observes a torn model. A failed persistence or training
//! step leaves the published revision untouched.

pub mod sqlite;

pub use sqlite::SqliteModelStore;

use crate::affinity::MusicalAffinityTable;
use crate::nn::MlpClassifier;
use crate::personality::PersonalityProfile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Persistence failure — degrades to in-memory-only operation, never
/// invalidates a training result already held in memory
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed
    #[error("storage database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Artifact (de)serialization failed
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The three training artifacts, versioned and persisted together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifacts {
    /// Baseline classifier
    pub model: MlpClassifier,
    /// Derived trait weights
    pub personality: PersonalityProfile,
    /// Derived genre priors
    pub affinity: MusicalAffinityTable,
    /// When the producing training run finished
    pub trained_at: DateTime<Utc>,
}

/// One published (or publishable) model revision
///
/// Immutable once created; revisions are replaced, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRevision {
    /// Opaque monotonically increasing version
    pub version: i64,
    /// The artifact bundle
    pub artifacts: ModelArtifacts,
}

/// External key-value model store
///
/// `put` allocates and returns the next version; callers explicitly select
/// versions on `get`, or resolve the newest with `latest`.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Persist a new artifact bundle under the next version
    async fn put(&self, artifacts: &ModelArtifacts) -> Result<i64, StoreError>;

    /// Fetch a specific version (None if absent)
    async fn get(&self, version: i64) -> Result<Option<ModelRevision>, StoreError>;

    /// Fetch the highest version (None if the store is empty)
    async fn latest(&self) -> Result<Option<ModelRevision>, StoreError>;
}

/// In-process model store
///
/// Backs tests and the degraded mode entered when SQLite persistence
/// fails: versions stay monotonic, nothing survives a restart.
#[derive(Default)]
pub struct MemoryModelStore {
    revisions: RwLock<BTreeMap<i64, ModelArtifacts>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn put(&self, artifacts: &ModelArtifacts) -> Result<i64, StoreError> {
        let mut revisions = self.revisions.write().unwrap();
        let version = revisions.keys().next_back().copied().unwrap_or(0) + 1;
        revisions.insert(version, artifacts.clone());
        Ok(version)
    }

    async fn get(&self, version: i64) -> Result<Option<ModelRevision>, StoreError> {
        let revisions = self.revisions.read().unwrap();
        Ok(revisions.get(&version).map(|artifacts| ModelRevision {
            version,
            artifacts: artifacts.clone(),
        }))
    }

    async fn latest(&self) -> Result<Option<ModelRevision>, StoreError> {
        let revisions = self.revisions.read().unwrap();
        Ok(revisions
            .iter()
            .next_back()
            .map(|(&version, artifacts)| ModelRevision {
                version,
                artifacts: artifacts.clone(),
            }))
    }
}

/// Holder of the currently published revision
///
/// Readers clone the `Arc` under a briefly held read lock; writers swap
/// the whole `Arc`. A reader therefore sees either the old or the new
/// revision in full, never a mixture.
#[derive(Default)]
pub struct ModelSlot {
    current: RwLock<Option<Arc<ModelRevision>>>,
}

impl ModelSlot {
    /// Empty slot: the engine reports ModelUnavailable until a publish
    pub fn empty() -> Self {
        Self::default()
    }

    /// Atomically replace the published revision
    ///
    /// Published versions never regress: store-allocated versions and
    /// locally allocated fallback versions (degraded store, restart with
    /// a stale database) can fall behind the slot, so a non-increasing
    /// version is bumped to `current + 1` at publication. Callers must
    /// read the version from the returned revision, not from their input.
    pub fn publish(&self, mut revision: ModelRevision) -> Arc<ModelRevision> {
        let mut current = self.current.write().unwrap();
        if let Some(published) = current.as_ref() {
            if revision.version <= published.version {
                warn!(
                    allocated = revision.version,
                    published = published.version,
                    "Allocated version lags the published revision, bumping"
                );
                revision.version = published.version + 1;
            }
        }
        let revision = Arc::new(revision);
        info!(version = revision.version, "Model revision published");
        *current = Some(Arc::clone(&revision));
        revision
    }

    /// The currently published revision, if any
    pub fn current(&self) -> Option<Arc<ModelRevision>> {
        self.current.read().unwrap().clone()
    }

    /// Version of the published revision, if any
    pub fn version(&self) -> Option<i64> {
        self.current.read().unwrap().as_ref().map(|r| r.version)
    }
}
