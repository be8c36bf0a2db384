//! Lupine Storage
//!
//! This crate provides the key-value backend contract consumed by the
//! checkpoint layer, plus two reference implementations:
//! - [`MemoryStorage`] for tests and single-process use
//! - [`FsStorage`] persisting the key tree as directories and files
//!
//! The [`Storage`] trait defines atomic put/get of opaque payloads and a
//! prefix scan of immediate child names. Payloads carry a `structured` flag
//! distinguishing document-encoded artifacts from raw binary ones; readers
//! must use the same flag the writer used.

mod fs;
mod key;
mod memory;

pub use fs::FsStorage;
pub use key::StorageKey;
pub use memory::MemoryStorage;

use async_trait::async_trait;

/// Error type for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  /// The requested key has no value. A first-class outcome, distinct from
  /// any read failure.
  #[error("key not found: {0}")]
  NotFound(String),

  /// An I/O error occurred.
  #[error("storage i/o error: {0}")]
  Io(#[from] std::io::Error),

  /// The value was written with the other encoding mode.
  #[error("encoding mismatch for key: {0}")]
  EncodingMismatch(String),
}

/// Backend contract: atomic single-key put/get plus prefix scan.
///
/// Implementations must be safe for concurrent access to distinct keys. No
/// multi-key atomicity is required or assumed.
#[async_trait]
pub trait Storage: Send + Sync {
  /// Store `payload` under `key`, replacing any previous value. `structured`
  /// marks the payload as document-encoded rather than raw binary.
  async fn put(
    &self,
    key: &StorageKey,
    payload: Vec<u8>,
    structured: bool,
  ) -> Result<(), StorageError>;

  /// Fetch the payload stored under `key`. Fails with
  /// [`StorageError::NotFound`] when the key has no value.
  async fn get(&self, key: &StorageKey, structured: bool) -> Result<Vec<u8>, StorageError>;

  /// List the names of the immediate children under `prefix`. A prefix with
  /// no children yields an empty list.
  async fn scan_prefix(&self, prefix: &StorageKey) -> Result<Vec<String>, StorageError>;
}
