//! Error types for checkpoint operations.

use thiserror::Error;

type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the checkpoint layer.
///
/// Three failure kinds: `NotFound` (an expected, first-class outcome of a
/// read), `Load` (backend read error or unparseable payload), and `Save`
/// (backend write error). `Entrypoint` wraps a resolution failure with the
/// workflow it belongs to.
#[derive(Debug, Error)]
pub enum CheckpointError {
  /// The key has no value on storage.
  #[error("checkpoint key not found: {key}")]
  NotFound { key: String },

  /// Reading or decoding a checkpoint failed.
  #[error("failed to load checkpoint '{key}': {source}")]
  Load {
    key: String,
    #[source]
    source: Cause,
  },

  /// Writing or encoding a checkpoint failed.
  #[error("failed to save checkpoint '{key}': {source}")]
  Save {
    key: String,
    #[source]
    source: Cause,
  },

  /// The workflow has no recorded entrypoint (it never started).
  #[error("failed to resolve entrypoint step of workflow '{workflow_id}': {source}")]
  Entrypoint {
    workflow_id: String,
    #[source]
    source: Box<CheckpointError>,
  },
}

impl CheckpointError {
  /// Whether this error is the first-class "key absent" outcome.
  pub fn is_not_found(&self) -> bool {
    matches!(self, CheckpointError::NotFound { .. })
  }
}
