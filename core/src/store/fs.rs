// ferry/src/store/fs.rs

use crate::error::{FerryError, FerryResult};
use crate::store::{Addressing, Store, WriteParams};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{event, Level};

/// Store backed by a directory. Keys are relative file paths under it.
#[derive(Debug, Clone)]
pub struct FsStore {
  id: String,
  base_path: PathBuf,
}

impl FsStore {
  pub fn new(id: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
    Self {
      id: id.into(),
      base_path: base_path.into(),
    }
  }

  /// Creates the store, making sure its directory exists.
  pub async fn create(id: impl Into<String>, base_path: impl Into<PathBuf>) -> FerryResult<Self> {
    let store = Self::new(id, base_path);
    tokio::fs::create_dir_all(&store.base_path)
      .await
      .map_err(|e| FerryError::io(e, "create_dir_all", store.base_path.display().to_string()))?;
    Ok(store)
  }

  /// Keys must stay under the base directory: only plain relative components.
  fn resolve_path(&self, key: &str) -> FerryResult<PathBuf> {
    let relative = Path::new(key);
    if key.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
      return Err(FerryError::InvalidKey {
        store: self.id.clone(),
        key: key.to_string(),
      });
    }
    Ok(self.base_path.join(relative))
  }
}

#[async_trait]
impl Store for FsStore {
  fn id(&self) -> &str {
    &self.id
  }

  fn addressing(&self) -> Addressing<'_> {
    Addressing::Path(&self.base_path)
  }

  async fn read(&self, key: &str) -> FerryResult<Bytes> {
    let full_path = self.resolve_path(key)?;
    event!(Level::TRACE, path = %full_path.display(), "Reading file.");
    match tokio::fs::read(&full_path).await {
      Ok(contents) => Ok(Bytes::from(contents)),
      Err(e) if e.kind() == ErrorKind::NotFound => Err(FerryError::KeyNotFound {
        store: self.id.clone(),
        key: key.to_string(),
      }),
      Err(e) => Err(FerryError::io(e, "read", full_path.display().to_string())),
    }
  }

  async fn write(&self, key: &str, bytes: Bytes, _params: &WriteParams) -> FerryResult<()> {
    let full_path = self.resolve_path(key)?;
    if let Some(parent) = full_path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| FerryError::io(e, "create_dir_all", parent.display().to_string()))?;
    }
    event!(Level::TRACE, path = %full_path.display(), size = bytes.len(), "Writing file.");
    tokio::fs::write(&full_path, &bytes)
      .await
      .map_err(|e| FerryError::io(e, "write", full_path.display().to_string()))
  }

  async fn exists(&self, key: &str) -> FerryResult<bool> {
    let full_path = self.resolve_path(key)?;
    tokio::fs::try_exists(&full_path)
      .await
      .map_err(|e| FerryError::io(e, "exists", full_path.display().to_string()))
  }

  async fn remove(&self, key: &str) -> FerryResult<()> {
    let full_path = self.resolve_path(key)?;
    match tokio::fs::remove_file(&full_path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(FerryError::io(e, "remove_file", full_path.display().to_string())),
    }
  }

  fn path(&self) -> Option<&Path> {
    Some(&self.base_path)
  }
}
