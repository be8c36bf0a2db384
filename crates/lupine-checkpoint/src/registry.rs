//! Workflow-level metadata, progress markers, and workflow listing.

use std::sync::Arc;

use futures::future::join_all;
use lupine_storage::{Storage, StorageKey};
use lupine_workflow::{StepId, WorkflowMetadata, WorkflowProgress, WorkflowSummary};

use crate::WorkflowStorage;
use crate::error::CheckpointError;
use crate::keys;
use crate::store::CheckpointStore;

impl WorkflowStorage {
  /// Persist the workflow's metadata record.
  pub async fn save_workflow_meta(
    &self,
    metadata: &WorkflowMetadata,
  ) -> Result<(), CheckpointError> {
    let key = keys::workflow_metadata(&self.workflow_id);
    self.store.put_doc(&key, metadata).await
  }

  /// Load the workflow's metadata record. Absence is a valid outcome, not
  /// an error: a workflow that was never registered yields `None`.
  pub async fn load_workflow_meta(&self) -> Result<Option<WorkflowMetadata>, CheckpointError> {
    let key = keys::workflow_metadata(&self.workflow_id);
    match self.store.get_doc::<WorkflowMetadata>(&key).await {
      Ok(metadata) => Ok(Some(metadata)),
      Err(e) if e.is_not_found() => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// Record the step that produced the most recently observed output. Used
  /// by long-lived stateful-actor workflows to find where execution left
  /// off without re-walking history.
  pub async fn advance_progress(&self, finished_step_id: &str) -> Result<(), CheckpointError> {
    let key = keys::workflow_progress(&self.workflow_id);
    self
      .store
      .put_doc(
        &key,
        &WorkflowProgress {
          step_id: finished_step_id.to_string(),
        },
      )
      .await
  }

  /// Load the latest progress marker.
  pub async fn get_latest_progress(&self) -> Result<StepId, CheckpointError> {
    let key = keys::workflow_progress(&self.workflow_id);
    let progress: WorkflowProgress = self.store.get_doc(&key).await?;
    Ok(progress.step_id)
  }
}

/// Enumerate all workflows known to the backend.
///
/// Metadata loads are issued concurrently and are best-effort: a workflow
/// whose metadata is missing or unreadable is still listed, with an unknown
/// status, rather than aborting the scan.
pub async fn list_workflow(
  storage: Arc<dyn Storage>,
) -> Result<Vec<WorkflowSummary>, CheckpointError> {
  let store = CheckpointStore::new(storage);
  let workflow_ids = store.scan(&StorageKey::root()).await?;
  let summaries = join_all(workflow_ids.into_iter().map(|workflow_id| {
    let store = store.clone();
    async move {
      let status = store
        .get_doc::<WorkflowMetadata>(&keys::workflow_metadata(&workflow_id))
        .await
        .ok()
        .map(|metadata| metadata.status);
      WorkflowSummary {
        workflow_id,
        status,
      }
    }
  }))
  .await;
  Ok(summaries)
}
