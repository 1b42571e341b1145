// ferry/src/store/mod.rs

//! Artifact stores: a uniform read/write/exists capability set over
//! interchangeable backends, plus the service and resolver hooks use to
//! locate them.
//!
//! A store also declares how it can be addressed besides plain key I/O
//! ([`Addressing`]). Hooks that need a specific addressing mode state it as a
//! [`StoreRequirement`] and the resolver checks it before handing the store out.

pub mod bucket;
pub mod descriptor;
pub mod fs;
pub mod memory;
pub mod resolver;
pub mod service;

use crate::error::FerryResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use bucket::{BucketStore, ObjectClient};
pub use descriptor::{StoreConfig, StoreDescriptor, StoreKind};
pub use fs::FsStore;
pub use memory::{BufferMap, MemoryStore};
pub use resolver::{StoreLookup, StoreSlot};
pub use service::StoresService;

/// Shared handle to a live store.
pub type StoreHandle = Arc<dyn Store>;

/// How a store can be addressed beyond `read`/`write`.
#[derive(Debug, Clone, Copy)]
pub enum Addressing<'a> {
  /// Filesystem-backed: keys are files under this directory.
  Path(&'a Path),
  /// In-memory buffer map.
  Buffers,
  /// Object storage; reachable only through key I/O.
  Opaque,
}

/// The addressing a hook needs from the store it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRequirement {
  Any,
  Path,
  PathOrBuffers,
}

impl StoreRequirement {
  pub fn is_satisfied_by(self, addressing: Addressing<'_>) -> bool {
    match (self, addressing) {
      (StoreRequirement::Any, _) => true,
      (StoreRequirement::Path, Addressing::Path(_)) => true,
      (StoreRequirement::PathOrBuffers, Addressing::Path(_) | Addressing::Buffers) => true,
      _ => false,
    }
  }
}

impl fmt::Display for StoreRequirement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreRequirement::Any => f.write_str("any"),
      StoreRequirement::Path => f.write_str("filesystem path"),
      StoreRequirement::PathOrBuffers => f.write_str("filesystem path or in-memory buffer"),
    }
  }
}

/// Backend-specific write options (`storageOptions` in hook configuration).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteParams {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content_type: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl WriteParams {
  pub fn with_content_type(content_type: &str) -> Self {
    WriteParams {
      content_type: Some(content_type.to_string()),
      extra: Map::new(),
    }
  }
}

#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
  /// Identifier the store is registered under.
  fn id(&self) -> &str;

  fn addressing(&self) -> Addressing<'_>;

  async fn read(&self, key: &str) -> FerryResult<Bytes>;

  async fn write(&self, key: &str, bytes: Bytes, params: &WriteParams) -> FerryResult<()>;

  async fn exists(&self, key: &str) -> FerryResult<bool>;

  async fn remove(&self, key: &str) -> FerryResult<()>;

  /// The directory a filesystem store writes into.
  fn path(&self) -> Option<&Path> {
    match self.addressing() {
      Addressing::Path(path) => Some(path),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn requirement_matches_addressing() {
    let dir = PathBuf::from("/tmp");
    assert!(StoreRequirement::Any.is_satisfied_by(Addressing::Opaque));
    assert!(StoreRequirement::Path.is_satisfied_by(Addressing::Path(&dir)));
    assert!(!StoreRequirement::Path.is_satisfied_by(Addressing::Buffers));
    assert!(StoreRequirement::PathOrBuffers.is_satisfied_by(Addressing::Buffers));
    assert!(!StoreRequirement::PathOrBuffers.is_satisfied_by(Addressing::Opaque));
  }
}
