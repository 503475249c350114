//! SQLite model store
//!
//! One row per revision in `model_revisions`; artifacts are stored as a
//! JSON blob. The INTEGER PRIMARY KEY gives monotonically increasing
//! versions for free (SQLite rowid allocation), and rows are insert-only —
//! a revision is never updated or deleted.

use super::{ModelArtifacts, ModelRevision, ModelStore, StoreError};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::debug;

/// SQLite-backed model store
pub struct SqliteModelStore {
    pool: SqlitePool,
}

impl SqliteModelStore {
    /// Open (or create) the store at the given path
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(sqlx::Error::Io(e))
                })?;
            }
        }

        // mode=rwc: read, write, create
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        debug!("Connecting to model store: {}", db_url);
        let pool = SqlitePool::connect(&db_url).await?;

        let store = Self { pool };
        store.init_tables().await?;
        Ok(store)
    }

    async fn init_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS model_revisions (
                version INTEGER PRIMARY KEY AUTOINCREMENT,
                artifacts TEXT NOT NULL,
                trained_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        tracing::info!("Model store tables initialized (model_revisions)");
        Ok(())
    }

    fn row_to_revision(version: i64, artifacts_json: &str) -> Result<ModelRevision, StoreError> {
        let artifacts: ModelArtifacts = serde_json::from_str(artifacts_json)?;
        Ok(ModelRevision { version, artifacts })
    }
}

#[async_trait]
impl ModelStore for SqliteModelStore {
    async fn put(&self, artifacts: &ModelArtifacts) -> Result<i64, StoreError> {
        let artifacts_json = serde_json::to_string(artifacts)?;
        let result = sqlx::query(
            "INSERT INTO model_revisions (artifacts, trained_at) VALUES (?, ?)",
        )
        .bind(&artifacts_json)
        .bind(artifacts.trained_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let version = result.last_insert_rowid();
        debug!(version, "Model revision persisted");
        Ok(version)
    }

    async fn get(&self, version: i64) -> Result<Option<ModelRevision>, StoreError> {
        let row = sqlx::query("SELECT artifacts FROM model_revisions WHERE version = ?")
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let artifacts_json: String = row.get("artifacts");
                Ok(Some(Self::row_to_revision(version, &artifacts_json)?))
            }
            None => Ok(None),
        }
    }

    async fn latest(&self) -> Result<Option<ModelRevision>, StoreError> {
        let row = sqlx::query(
            "SELECT version, artifacts FROM model_revisions ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let version: i64 = row.get("version");
                let artifacts_json: String = row.get("artifacts");
                Ok(Some(Self::row_to_revision(version, &artifacts_json)?))
            }
            None => Ok(None),
        }
    }
}
