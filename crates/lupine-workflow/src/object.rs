/// A live handle to an externally managed object value.
///
/// The object subsystem resolves its handles to concrete payloads before they
/// reach this layer; the checkpoint store treats the payload as opaque bytes
/// keyed by the object's hex identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
  hex: String,
  payload: Vec<u8>,
}

impl ObjectHandle {
  pub fn new(hex: impl Into<String>, payload: Vec<u8>) -> Self {
    Self {
      hex: hex.into(),
      payload,
    }
  }

  /// The hex identity of the object.
  pub fn hex(&self) -> &str {
    &self.hex
  }

  pub fn payload(&self) -> &[u8] {
    &self.payload
  }

  pub fn into_payload(self) -> Vec<u8> {
    self.payload
  }
}
