//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services. Request
//! handling never reads environment variables.

use crate::constants::DEFAULT_MAX_BUNDLE_BYTES;
use crate::store::{BundleStore, FileBundleStore, MemoryBundleStore};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    bundle_data_dir: Option<PathBuf>,
    max_bundle_bytes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `bundle_data_dir` selects on-disk storage; `None` keeps accepted bundles in memory for
    /// the lifetime of the process.
    pub fn new(bundle_data_dir: Option<PathBuf>, max_bundle_bytes: usize) -> CoreResult<Self> {
        if max_bundle_bytes == 0 {
            return Err(CoreError::InvalidConfig(
                "max_bundle_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            bundle_data_dir,
            max_bundle_bytes,
        })
    }

    pub fn bundle_data_dir(&self) -> Option<&Path> {
        self.bundle_data_dir.as_deref()
    }

    pub fn max_bundle_bytes(&self) -> usize {
        self.max_bundle_bytes
    }

    /// Open the bundle store this configuration selects.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the data directory cannot be created.
    pub fn open_store(&self) -> CoreResult<Arc<dyn BundleStore>> {
        match &self.bundle_data_dir {
            Some(dir) => {
                tracing::info!("storing bundles under {}", dir.display());
                Ok(Arc::new(FileBundleStore::open(dir.clone())?))
            }
            None => {
                tracing::warn!("BUNDLE_DATA_DIR not set; accepted bundles are kept in memory");
                Ok(Arc::new(MemoryBundleStore::new()))
            }
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            bundle_data_dir: None,
            max_bundle_bytes: DEFAULT_MAX_BUNDLE_BYTES,
        }
    }
}

/// Parse the bundle data directory from an optional string value.
///
/// `None` or empty/whitespace selects in-memory storage.
pub fn bundle_data_dir_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Parse the upload size limit from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_BUNDLE_BYTES`].
pub fn max_bundle_bytes_from_env_value(value: Option<String>) -> CoreResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_MAX_BUNDLE_BYTES),
        Some(v) => v.parse::<usize>().map_err(|e| {
            CoreError::InvalidConfig(format!("DUALCODE_MAX_BUNDLE_BYTES '{v}' is invalid: {e}"))
        }),
    }
}
