//! Storage collaborator for accepted bundles.
//!
//! The processor's responsibility ends at "this bundle is acceptable"; keeping it is delegated
//! to a [`BundleStore`]. Two implementations are provided:
//! - [`MemoryBundleStore`] for development and tests
//! - [`FileBundleStore`], which writes one JSON file per bundle under a sharded directory tree
//!
//! ## On-disk layout
//! `<data_dir>/<id[0..2]>/<id[2..4]>/<id>/bundle.json`

use crate::constants::BUNDLE_JSON_FILENAME;
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dualcode_uuid::BundleId;
use fhir::BundleType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

/// A bundle as kept by the store, with the metadata needed to list it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredBundle {
    pub id: BundleId,
    pub received_at: DateTime<Utc>,
    pub bundle_type: BundleType,
    pub resource_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// The uploaded JSON, unchanged.
    pub bundle: Value,
}

impl StoredBundle {
    pub fn summary(&self) -> BundleSummary {
        BundleSummary {
            id: self.id,
            received_at: self.received_at,
            bundle_type: self.bundle_type,
            resource_count: self.resource_count,
            file_name: self.file_name.clone(),
        }
    }
}

/// Listing view of a stored bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BundleSummary {
    pub id: BundleId,
    pub received_at: DateTime<Utc>,
    pub bundle_type: BundleType,
    pub resource_count: usize,
    pub file_name: Option<String>,
}

/// Persistence contract for accepted bundles, keyed by bundle id.
#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Store a bundle. An existing bundle with the same id is replaced.
    async fn put(&self, bundle: StoredBundle) -> StoreResult<()>;

    /// Fetch a bundle by id, or `None` if it is unknown.
    async fn get(&self, id: &BundleId) -> StoreResult<Option<StoredBundle>>;

    /// Summaries of every stored bundle, newest first.
    async fn list(&self) -> StoreResult<Vec<BundleSummary>>;

    /// Remove a bundle. Returns `false` if it was not stored.
    async fn delete(&self, id: &BundleId) -> StoreResult<bool>;
}

fn newest_first(summaries: &mut [BundleSummary]) {
    summaries.sort_by(|a, b| b.received_at.cmp(&a.received_at));
}

// ============================================================================
// In-memory store
// ============================================================================

/// Bundles held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBundleStore {
    bundles: RwLock<HashMap<BundleId, StoredBundle>>,
}

impl MemoryBundleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BundleStore for MemoryBundleStore {
    async fn put(&self, bundle: StoredBundle) -> StoreResult<()> {
        self.bundles.write().await.insert(bundle.id, bundle);
        Ok(())
    }

    async fn get(&self, id: &BundleId) -> StoreResult<Option<StoredBundle>> {
        Ok(self.bundles.read().await.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<BundleSummary>> {
        let mut summaries: Vec<BundleSummary> = self
            .bundles
            .read()
            .await
            .values()
            .map(StoredBundle::summary)
            .collect();
        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &BundleId) -> StoreResult<bool> {
        Ok(self.bundles.write().await.remove(id).is_some())
    }
}

// ============================================================================
// File store
// ============================================================================

/// Bundles stored as JSON files in a sharded directory tree.
#[derive(Clone, Debug)]
pub struct FileBundleStore {
    data_dir: PathBuf,
}

impl FileBundleStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DirCreation`] if the directory cannot be created.
    pub fn open(data_dir: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&data_dir).map_err(StoreError::DirCreation)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn bundle_path(&self, id: &BundleId) -> PathBuf {
        id.sharded_dir(&self.data_dir).join(BUNDLE_JSON_FILENAME)
    }

    async fn read_bundle(path: &Path) -> StoreResult<Option<StoredBundle>> {
        let contents = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::FileRead(e)),
        };
        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(StoreError::Deserialization)
    }

    /// Every `<s1>/<s2>/<id>/` directory under the data dir.
    ///
    /// Stray files at any level are ignored; I/O failures are not.
    async fn bundle_dirs(&self) -> StoreResult<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for s1 in Self::subdirs(&self.data_dir).await? {
            for s2 in Self::subdirs(&s1).await? {
                dirs.extend(Self::subdirs(&s2).await?);
            }
        }
        Ok(dirs)
    }

    async fn subdirs(dir: &Path) -> StoreResult<Vec<PathBuf>> {
        let mut iter = fs::read_dir(dir).await.map_err(StoreError::FileRead)?;
        let mut dirs = Vec::new();
        while let Some(entry) = iter.next_entry().await.map_err(StoreError::FileRead)? {
            if entry.file_type().await.map_err(StoreError::FileRead)?.is_dir() {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }
}

#[async_trait]
impl BundleStore for FileBundleStore {
    async fn put(&self, bundle: StoredBundle) -> StoreResult<()> {
        let dir = bundle.id.sharded_dir(&self.data_dir);
        fs::create_dir_all(&dir)
            .await
            .map_err(StoreError::DirCreation)?;

        let json = serde_json::to_vec_pretty(&bundle).map_err(StoreError::Serialization)?;
        let final_path = dir.join(BUNDLE_JSON_FILENAME);
        let tmp_path = dir.join(format!("{BUNDLE_JSON_FILENAME}.tmp"));

        fs::write(&tmp_path, json)
            .await
            .map_err(StoreError::FileWrite)?;
        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::FileWrite(e));
        }

        tracing::debug!("wrote bundle {} to {}", bundle.id, final_path.display());
        Ok(())
    }

    async fn get(&self, id: &BundleId) -> StoreResult<Option<StoredBundle>> {
        Self::read_bundle(&self.bundle_path(id)).await
    }

    async fn list(&self) -> StoreResult<Vec<BundleSummary>> {
        let mut summaries = Vec::new();
        for dir in self.bundle_dirs().await? {
            let path = dir.join(BUNDLE_JSON_FILENAME);
            match Self::read_bundle(&path).await {
                Ok(Some(stored)) => summaries.push(stored.summary()),
                Ok(None) => {}
                Err(e) => tracing::warn!("skipping unreadable bundle {}: {}", path.display(), e),
            }
        }
        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &BundleId) -> StoreResult<bool> {
        match fs::remove_dir_all(id.sharded_dir(&self.data_dir)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::FileRemove(e)),
        }
    }
}
