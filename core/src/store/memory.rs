// ferry/src/store/memory.rs

use crate::error::{FerryError, FerryResult};
use crate::store::{Addressing, Store, WriteParams};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Key to buffer map backing a [`MemoryStore`]. Clones share the same buffers.
#[derive(Debug, Clone, Default)]
pub struct BufferMap(Arc<RwLock<HashMap<String, Bytes>>>);

impl BufferMap {
  pub fn get(&self, key: &str) -> Option<Bytes> {
    self.0.read().get(key).cloned()
  }

  pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Bytes>) {
    self.0.write().insert(key.into(), bytes.into());
  }

  pub fn remove(&self, key: &str) -> Option<Bytes> {
    self.0.write().remove(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.0.read().contains_key(key)
  }

  pub fn keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.0.read().keys().cloned().collect();
    keys.sort();
    keys
  }

  pub fn len(&self) -> usize {
    self.0.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.read().is_empty()
  }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
  id: String,
  buffers: BufferMap,
}

impl MemoryStore {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      buffers: BufferMap::default(),
    }
  }

  pub fn buffers(&self) -> &BufferMap {
    &self.buffers
  }
}

#[async_trait]
impl Store for MemoryStore {
  fn id(&self) -> &str {
    &self.id
  }

  fn addressing(&self) -> Addressing<'_> {
    Addressing::Buffers
  }

  async fn read(&self, key: &str) -> FerryResult<Bytes> {
    self.buffers.get(key).ok_or_else(|| FerryError::KeyNotFound {
      store: self.id.clone(),
      key: key.to_string(),
    })
  }

  async fn write(&self, key: &str, bytes: Bytes, _params: &WriteParams) -> FerryResult<()> {
    self.buffers.insert(key, bytes);
    Ok(())
  }

  async fn exists(&self, key: &str) -> FerryResult<bool> {
    Ok(self.buffers.contains(key))
  }

  async fn remove(&self, key: &str) -> FerryResult<()> {
    self.buffers.remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn clones_share_buffers() {
    let store = MemoryStore::new("mem");
    let other = store.clone();
    store
      .write("a.json", Bytes::from_static(b"[1]"), &WriteParams::default())
      .await
      .unwrap();
    assert_eq!(other.read("a.json").await.unwrap(), Bytes::from_static(b"[1]"));
    assert_eq!(other.buffers().keys(), vec!["a.json".to_string()]);
  }

  #[tokio::test]
  async fn missing_key_is_reported() {
    let store = MemoryStore::new("mem");
    let err = store.read("nope").await.unwrap_err();
    assert!(matches!(err, FerryError::KeyNotFound { ref key, .. } if key == "nope"));
    assert!(!store.exists("nope").await.unwrap());
  }
}
