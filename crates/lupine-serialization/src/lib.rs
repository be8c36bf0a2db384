//! Lupine Serialization
//!
//! This crate models the checkpointed form of step arguments. Arguments are
//! stored as a flattened positional/keyword structure in which live handles
//! (object references, nested workflow results, dynamically bound workflow
//! references) are replaced by placeholder slots. At load time the caller
//! supplies the live values through an explicit [`ResolvingContext`] and the
//! decoder substitutes them back into their original positions.
//!
//! The resolving context is a plain value passed into the decode call, never
//! ambient state, so resolution is reentrant and testable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while encoding or decoding argument payloads.
#[derive(Debug, Error)]
pub enum ArgsError {
  /// The stored payload could not be parsed.
  #[error("malformed argument payload: {0}")]
  Malformed(#[from] serde_json::Error),

  /// A placeholder slot referenced a live value that was not supplied.
  #[error("{kind} placeholder index {index} out of range ({supplied} supplied)")]
  UnresolvedPlaceholder {
    kind: &'static str,
    index: usize,
    supplied: usize,
  },
}

/// One position in a stored argument payload.
///
/// Placeholder variants carry an index into the corresponding live-value list
/// of the [`ResolvingContext`] used at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgSlot {
  /// A literal value stored inline.
  Literal { value: Value },
  /// A reference to an externally stored object.
  ObjectRef { index: usize },
  /// The output of a nested workflow.
  Workflow { index: usize },
  /// A dynamically bound workflow reference.
  WorkflowRef { index: usize },
}

/// The checkpointed form of a step's positional and keyword arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgsPayload {
  pub args: Vec<ArgSlot>,
  pub kwargs: BTreeMap<String, ArgSlot>,
}

/// Arguments after placeholder substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArgs {
  pub args: Vec<Value>,
  pub kwargs: BTreeMap<String, Value>,
}

/// Live values substituted for placeholder slots during decode.
///
/// The three lists are positional: a slot with `index = i` resolves to the
/// `i`-th entry of the matching list.
#[derive(Debug, Clone, Default)]
pub struct ResolvingContext {
  workflows: Vec<Value>,
  object_refs: Vec<Value>,
  workflow_refs: Vec<Value>,
}

impl ResolvingContext {
  pub fn new(workflows: Vec<Value>, object_refs: Vec<Value>, workflow_refs: Vec<Value>) -> Self {
    Self {
      workflows,
      object_refs,
      workflow_refs,
    }
  }

  fn resolve(&self, slot: &ArgSlot) -> Result<Value, ArgsError> {
    let (kind, index, values) = match slot {
      ArgSlot::Literal { value } => return Ok(value.clone()),
      ArgSlot::ObjectRef { index } => ("object_ref", *index, &self.object_refs),
      ArgSlot::Workflow { index } => ("workflow", *index, &self.workflows),
      ArgSlot::WorkflowRef { index } => ("workflow_ref", *index, &self.workflow_refs),
    };
    values
      .get(index)
      .cloned()
      .ok_or(ArgsError::UnresolvedPlaceholder {
        kind,
        index,
        supplied: values.len(),
      })
  }
}

/// Encode an argument payload into the opaque bytes stored as the step's
/// arguments artifact. Placeholder slots are kept as markers.
pub fn encode_args(payload: &ArgsPayload) -> Result<Vec<u8>, ArgsError> {
  Ok(serde_json::to_vec(payload)?)
}

/// Decode a stored arguments artifact, substituting the live values from
/// `ctx` back into every placeholder position.
pub fn decode_args(bytes: &[u8], ctx: &ResolvingContext) -> Result<ResolvedArgs, ArgsError> {
  let payload: ArgsPayload = serde_json::from_slice(bytes)?;
  let args = payload
    .args
    .iter()
    .map(|slot| ctx.resolve(slot))
    .collect::<Result<Vec<_>, _>>()?;
  let kwargs = payload
    .kwargs
    .iter()
    .map(|(name, slot)| Ok((name.clone(), ctx.resolve(slot)?)))
    .collect::<Result<BTreeMap<_, _>, ArgsError>>()?;
  Ok(ResolvedArgs { args, kwargs })
}
