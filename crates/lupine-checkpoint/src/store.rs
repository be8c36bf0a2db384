//! Typed wrappers over the raw backend.
//!
//! Every read and write is classified here: a backend write failure surfaces
//! as [`CheckpointError::Save`], a read failure other than "key absent" as
//! [`CheckpointError::Load`], and absence as the distinct
//! [`CheckpointError::NotFound`]. Document payloads are JSON-encoded; binary
//! payloads pass through untouched.

use std::sync::Arc;

use lupine_storage::{Storage, StorageError, StorageKey};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CheckpointError;

/// Typed put/get/scan over an [`Storage`] backend.
///
/// Cheap to clone; operations against distinct keys are independent and no
/// multi-key atomicity is provided.
#[derive(Clone)]
pub struct CheckpointStore {
  storage: Arc<dyn Storage>,
}

impl CheckpointStore {
  pub fn new(storage: Arc<dyn Storage>) -> Self {
    Self { storage }
  }

  fn classify_read(key: &StorageKey, e: StorageError) -> CheckpointError {
    match e {
      StorageError::NotFound(key) => CheckpointError::NotFound { key },
      other => CheckpointError::Load {
        key: key.as_str().to_string(),
        source: Box::new(other),
      },
    }
  }

  /// Store a raw binary payload.
  pub async fn put_raw(&self, key: &StorageKey, payload: Vec<u8>) -> Result<(), CheckpointError> {
    self
      .storage
      .put(key, payload, false)
      .await
      .map_err(|e| CheckpointError::Save {
        key: key.as_str().to_string(),
        source: Box::new(e),
      })
  }

  /// Fetch a raw binary payload.
  pub async fn get_raw(&self, key: &StorageKey) -> Result<Vec<u8>, CheckpointError> {
    self
      .storage
      .get(key, false)
      .await
      .map_err(|e| Self::classify_read(key, e))
  }

  /// Store a structured document.
  pub async fn put_doc<T: Serialize + ?Sized>(
    &self,
    key: &StorageKey,
    doc: &T,
  ) -> Result<(), CheckpointError> {
    let payload = serde_json::to_vec(doc).map_err(|e| CheckpointError::Save {
      key: key.as_str().to_string(),
      source: Box::new(e),
    })?;
    self
      .storage
      .put(key, payload, true)
      .await
      .map_err(|e| CheckpointError::Save {
        key: key.as_str().to_string(),
        source: Box::new(e),
      })
  }

  /// Fetch and decode a structured document.
  pub async fn get_doc<T: DeserializeOwned>(&self, key: &StorageKey) -> Result<T, CheckpointError> {
    let payload = self
      .storage
      .get(key, true)
      .await
      .map_err(|e| Self::classify_read(key, e))?;
    serde_json::from_slice(&payload).map_err(|e| CheckpointError::Load {
      key: key.as_str().to_string(),
      source: Box::new(e),
    })
  }

  /// List the immediate child names under a key prefix.
  pub async fn scan(&self, prefix: &StorageKey) -> Result<Vec<String>, CheckpointError> {
    self
      .storage
      .scan_prefix(prefix)
      .await
      .map_err(|e| CheckpointError::Load {
        key: prefix.as_str().to_string(),
        source: Box::new(e),
      })
  }
}
