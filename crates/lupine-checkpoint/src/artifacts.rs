//! Step artifact persistence: outputs, function bodies, arguments,
//! sub-workflow graphs, object records, and actor class bodies.

use futures::future::try_join_all;
use futures::try_join;
use lupine_serialization::{ResolvedArgs, ResolvingContext, decode_args, encode_args};
use lupine_workflow::{ObjectHandle, StepId, StepOutputMetadata, StepSpec, SubWorkflow};
use tracing::{debug, instrument};

use crate::WorkflowStorage;
use crate::error::CheckpointError;
use crate::keys;

/// A concrete step result: either inline bytes or an already-resolved handle
/// from the external object subsystem.
#[derive(Debug, Clone)]
pub enum TaskOutput {
  Inline(Vec<u8>),
  Object(ObjectHandle),
}

impl TaskOutput {
  fn into_bytes(self) -> Vec<u8> {
    match self {
      TaskOutput::Inline(bytes) => bytes,
      TaskOutput::Object(handle) => handle.into_payload(),
    }
  }
}

/// What a step returned: a concrete value, or a nested workflow whose root
/// step will eventually hold the real output.
#[derive(Debug, Clone)]
pub enum StepReturn {
  Value(TaskOutput),
  Workflow { root_step_id: StepId },
}

impl WorkflowStorage {
  /// Checkpoint the return of a completed step.
  ///
  /// A nested-workflow return persists output metadata pointing at the
  /// nested root instead of a concrete value; anything else persists the
  /// resolved bytes as the step's direct output. When `outer_most_step_id`
  /// names a real step (not the root-driver sentinel), the outermost step's
  /// dynamic pointer is advanced toward the new authoritative output. The
  /// output write and the pointer update target distinct keys and are issued
  /// together.
  #[instrument(skip(self, ret), fields(workflow_id = %self.workflow_id, step_id = %step_id))]
  pub async fn save_step_output(
    &self,
    step_id: &str,
    ret: StepReturn,
    outer_most_step_id: Option<&str>,
  ) -> Result<(), CheckpointError> {
    let dynamic_output_id: StepId = match &ret {
      StepReturn::Workflow { root_step_id } => {
        assert_ne!(
          step_id, root_step_id,
          "a nested workflow cannot have its own step as root"
        );
        root_step_id.clone()
      }
      StepReturn::Value(_) => step_id.to_string(),
    };

    let write = async {
      match ret {
        StepReturn::Workflow { root_step_id } => {
          let key = keys::step_output_metadata(&self.workflow_id, step_id);
          self
            .store
            .put_doc(&key, &StepOutputMetadata::new(root_step_id))
            .await
        }
        StepReturn::Value(output) => {
          let key = keys::step_output(&self.workflow_id, step_id);
          self.store.put_raw(&key, output.into_bytes()).await
        }
      }
    };
    // The root driver's own metadata must never be rewritten through this
    // path, or the root could end up pointing at itself.
    let shortcut = async {
      match outer_most_step_id {
        Some(outer) if !outer.is_empty() => {
          self.update_dynamic_output(outer, &dynamic_output_id).await
        }
        _ => Ok(()),
      }
    };
    try_join!(write, shortcut)?;
    Ok(())
  }

  /// Load the concrete output of a step.
  pub async fn load_step_output(&self, step_id: &str) -> Result<Vec<u8>, CheckpointError> {
    let key = keys::step_output(&self.workflow_id, step_id);
    self.store.get_raw(&key).await
  }

  /// Load the opaque function body of a step.
  pub async fn load_step_func_body(&self, step_id: &str) -> Result<Vec<u8>, CheckpointError> {
    let key = keys::step_func_body(&self.workflow_id, step_id);
    self.store.get_raw(&key).await
  }

  /// Load the arguments of a step, substituting the live values in `ctx`
  /// back into the positions that were checkpointed as placeholders.
  pub async fn load_step_args(
    &self,
    step_id: &str,
    ctx: &ResolvingContext,
  ) -> Result<ResolvedArgs, CheckpointError> {
    let key = keys::step_args(&self.workflow_id, step_id);
    let raw = self.store.get_raw(&key).await?;
    decode_args(&raw, ctx).map_err(|e| CheckpointError::Load {
      key: key.as_str().to_string(),
      source: Box::new(e),
    })
  }

  /// Checkpoint the full node set of a not-yet-executed sub-workflow: input
  /// metadata, function body, and bound arguments for every node. Nodes are
  /// independent until executed, so all writes are issued concurrently.
  ///
  /// # Panics
  /// Panics if the workflow has already been executed; that is a caller
  /// contract violation, not a runtime error.
  #[instrument(
    skip(self, workflow),
    fields(workflow_id = %self.workflow_id, root_step_id = %workflow.root_step_id())
  )]
  pub async fn save_subworkflow(&self, workflow: &SubWorkflow) -> Result<(), CheckpointError> {
    assert!(
      !workflow.executed(),
      "sub-workflow has already been executed"
    );
    try_join_all(workflow.steps().iter().map(|step| self.write_step_inputs(step))).await?;
    debug!(steps = workflow.steps().len(), "sub-workflow checkpointed");
    Ok(())
  }

  async fn write_step_inputs(&self, step: &StepSpec) -> Result<(), CheckpointError> {
    let args_key = keys::step_args(&self.workflow_id, &step.step_id);
    let args = encode_args(&step.args).map_err(|e| CheckpointError::Save {
      key: args_key.as_str().to_string(),
      source: Box::new(e),
    })?;
    let input_metadata_key = keys::step_input_metadata(&self.workflow_id, &step.step_id);
    let func_body_key = keys::step_func_body(&self.workflow_id, &step.step_id);
    try_join!(
      self.store.put_doc(&input_metadata_key, &step.inputs),
      self
        .store
        .put_raw(&func_body_key, step.func_body.clone()),
      self.store.put_raw(&args_key, args),
    )?;
    Ok(())
  }

  /// Return a zero-based disambiguation counter for a human-chosen step
  /// name. Read-modify-write: the next caller must see the incremented
  /// value. Concurrent callers can race; last write wins, which only risks
  /// a reused suffix for same-named steps created at the same instant.
  pub async fn gen_step_id(&self, step_name: &str) -> Result<u64, CheckpointError> {
    let key = keys::duplicate_name_counter(&self.workflow_id, step_name);
    match self.store.get_doc::<u64>(&key).await {
      Ok(count) => {
        self.store.put_doc(&key, &(count + 1)).await?;
        Ok(count + 1)
      }
      Err(e) if e.is_not_found() => {
        self.store.put_doc(&key, &0u64).await?;
        Ok(0)
      }
      Err(e) => Err(e),
    }
  }

  /// Persist a standalone object record under its hex identity. Objects are
  /// shared across steps and independent of any step's lifecycle.
  pub async fn save_object_ref(&self, handle: &ObjectHandle) -> Result<(), CheckpointError> {
    let key = keys::object_record(&self.workflow_id, handle.hex());
    self.store.put_raw(&key, handle.payload().to_vec()).await
  }

  /// Load a standalone object record by its hex identity.
  pub async fn load_object_ref(&self, object_hex: &str) -> Result<ObjectHandle, CheckpointError> {
    let key = keys::object_record(&self.workflow_id, object_hex);
    let payload = self.store.get_raw(&key).await?;
    Ok(ObjectHandle::new(object_hex, payload))
  }

  /// Persist the opaque class body of a long-lived stateful actor workflow.
  pub async fn save_actor_class_body(&self, body: Vec<u8>) -> Result<(), CheckpointError> {
    let key = keys::class_body(&self.workflow_id);
    self.store.put_raw(&key, body).await
  }

  /// Load the opaque class body of a long-lived stateful actor workflow.
  pub async fn load_actor_class_body(&self) -> Result<Vec<u8>, CheckpointError> {
    let key = keys::class_body(&self.workflow_id);
    self.store.get_raw(&key).await
  }
}
