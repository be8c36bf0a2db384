use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::{Storage, StorageError, StorageKey};

/// Filesystem-backed storage.
///
/// Each key maps to a file under the root directory, one path component per
/// key segment. Writes go through a hidden temporary file and a rename so a
/// reader never observes a half-written value. The `structured` flag is not
/// stored; the artifact-name convention (`.json` vs `.bin`) carries the
/// encoding distinction on disk.
pub struct FsStorage {
  root: PathBuf,
}

impl FsStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn path_for(&self, key: &StorageKey) -> PathBuf {
    let mut path = self.root.clone();
    for segment in key.segments() {
      path.push(segment);
    }
    path
  }
}

#[async_trait]
impl Storage for FsStorage {
  async fn put(
    &self,
    key: &StorageKey,
    payload: Vec<u8>,
    _structured: bool,
  ) -> Result<(), StorageError> {
    let path = self.path_for(key);
    let parent = path.parent().expect("key has at least one segment");
    fs::create_dir_all(parent).await?;

    let file_name = path
      .file_name()
      .expect("key has at least one segment")
      .to_string_lossy();
    let tmp = parent.join(format!(".{file_name}.tmp"));
    fs::write(&tmp, &payload).await?;
    fs::rename(&tmp, &path).await?;
    Ok(())
  }

  async fn get(&self, key: &StorageKey, _structured: bool) -> Result<Vec<u8>, StorageError> {
    match fs::read(self.path_for(key)).await {
      Ok(payload) => Ok(payload),
      Err(e) if e.kind() == ErrorKind::NotFound => {
        Err(StorageError::NotFound(key.as_str().to_string()))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn scan_prefix(&self, prefix: &StorageKey) -> Result<Vec<String>, StorageError> {
    let mut entries = match fs::read_dir(self.path_for(prefix)).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      let name = entry.file_name().to_string_lossy().to_string();
      // skip in-flight temporary files
      if !name.starts_with('.') {
        names.push(name);
      }
    }
    names.sort();
    Ok(names)
  }
}
