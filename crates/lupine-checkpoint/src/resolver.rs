//! Dynamic-output shortcutting and entrypoint resolution.
//!
//! A step whose return value is a nested workflow initially points at its
//! *direct* nested root. That root can itself keep returning deeper nested
//! workflows discovered only at runtime. Every time a deeper step completes,
//! the outermost step's pointer is advanced to it, so resolving a workflow's
//! current result stays one hop instead of a walk through every nesting
//! level.

use lupine_workflow::{ROOT_DRIVER_STEP_ID, StepId, StepOutputMetadata};
use tracing::debug;

use crate::WorkflowStorage;
use crate::error::CheckpointError;
use crate::keys;

impl WorkflowStorage {
  /// The step currently holding the authoritative output of `step_id`:
  /// its dynamic pointer when set, else its direct nested root. Fails with
  /// [`CheckpointError::NotFound`] when the step has no output metadata.
  pub async fn locate_output_step_id(&self, step_id: &str) -> Result<StepId, CheckpointError> {
    let key = keys::step_output_metadata(&self.workflow_id, step_id);
    let metadata: StepOutputMetadata = self.store.get_doc(&key).await?;
    Ok(metadata.into_resolved_step_id())
  }

  /// Advance the outermost step's dynamic pointer to `dynamic_output_step_id`.
  ///
  /// A no-op when the candidate already equals either pointer field, so
  /// repeated completions never rewrite the same value. The read and write
  /// are separate backend operations; two racing updates can lose one write,
  /// which is tolerated as "last advance wins" since the lost pointer is
  /// re-discovered when the next nested step completes.
  pub async fn update_dynamic_output(
    &self,
    outer_most_step_id: &str,
    dynamic_output_step_id: &str,
  ) -> Result<(), CheckpointError> {
    let key = keys::step_output_metadata(&self.workflow_id, outer_most_step_id);
    let mut metadata: StepOutputMetadata = self.store.get_doc(&key).await?;
    if dynamic_output_step_id != metadata.output_step_id
      && metadata.dynamic_output_step_id.as_deref() != Some(dynamic_output_step_id)
    {
      metadata.dynamic_output_step_id = Some(dynamic_output_step_id.to_string());
      self.store.put_doc(&key, &metadata).await?;
      debug!(
        workflow_id = %self.workflow_id,
        outer_most_step_id,
        dynamic_output_step_id,
        "advanced dynamic output pointer"
      );
    }
    Ok(())
  }

  /// Resolve the step currently holding the workflow's live result, starting
  /// from the root driver's output metadata and following forwarding
  /// pointers until a step with no output metadata (its output is concrete
  /// or still pending). The dynamic pointers keep this a constant number of
  /// hops no matter how deep the nesting grew. Fails, with the workflow id
  /// attached, when the workflow never recorded a root output.
  pub async fn get_entrypoint_step_id(&self) -> Result<StepId, CheckpointError> {
    let mut current = self
      .locate_output_step_id(ROOT_DRIVER_STEP_ID)
      .await
      .map_err(|e| CheckpointError::Entrypoint {
        workflow_id: self.workflow_id.clone(),
        source: Box::new(e),
      })?;
    loop {
      match self.locate_output_step_id(&current).await {
        Ok(next) if next != current => current = next,
        Ok(_) => break,
        Err(e) if e.is_not_found() => break,
        Err(e) => return Err(e),
      }
    }
    Ok(current)
  }
}
