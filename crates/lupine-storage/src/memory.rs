use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Storage, StorageError, StorageKey};

struct Entry {
  payload: Vec<u8>,
  structured: bool,
}

/// In-memory storage implementation.
///
/// Suitable for tests and single-process use. Records the encoding mode of
/// every value and rejects reads that use the wrong decode path, keeping the
/// document/binary distinction observable.
#[derive(Default)]
pub struct MemoryStorage {
  data: Mutex<HashMap<String, Entry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Storage for MemoryStorage {
  async fn put(
    &self,
    key: &StorageKey,
    payload: Vec<u8>,
    structured: bool,
  ) -> Result<(), StorageError> {
    let mut data = self.data.lock().expect("storage mutex poisoned");
    data.insert(key.as_str().to_string(), Entry { payload, structured });
    Ok(())
  }

  async fn get(&self, key: &StorageKey, structured: bool) -> Result<Vec<u8>, StorageError> {
    let data = self.data.lock().expect("storage mutex poisoned");
    let entry = data
      .get(key.as_str())
      .ok_or_else(|| StorageError::NotFound(key.as_str().to_string()))?;
    if entry.structured != structured {
      return Err(StorageError::EncodingMismatch(key.as_str().to_string()));
    }
    Ok(entry.payload.clone())
  }

  async fn scan_prefix(&self, prefix: &StorageKey) -> Result<Vec<String>, StorageError> {
    let data = self.data.lock().expect("storage mutex poisoned");
    let prefix = if prefix.as_str().is_empty() {
      String::new()
    } else {
      format!("{}/", prefix.as_str())
    };
    let mut names: Vec<String> = data
      .keys()
      .filter_map(|key| key.strip_prefix(&prefix))
      .filter_map(|rest| rest.split('/').next())
      .map(str::to_string)
      .collect();
    names.sort();
    names.dedup();
    Ok(names)
  }
}
