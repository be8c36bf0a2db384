use std::fmt;

/// A hierarchical storage key: `/`-joined segments.
///
/// Keys are only ever built from path segments, so no segment may be empty
/// or contain a separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
  /// The empty key, parent of every workflow's subtree.
  pub fn root() -> Self {
    Self(String::new())
  }

  /// Build a key from path segments.
  pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
    let mut key = Self::root();
    for segment in segments {
      key = key.child(segment);
    }
    key
  }

  /// Extend the key with one more segment.
  pub fn child(&self, segment: &str) -> Self {
    debug_assert!(
      !segment.is_empty() && !segment.contains('/'),
      "invalid key segment: {segment:?}"
    );
    if self.0.is_empty() {
      Self(segment.to_string())
    } else {
      Self(format!("{}/{}", self.0, segment))
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Iterate the key's segments.
  pub fn segments(&self) -> impl Iterator<Item = &str> {
    self.0.split('/').filter(|s| !s.is_empty())
  }
}

impl fmt::Display for StorageKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
