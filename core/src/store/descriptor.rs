// ferry/src/store/descriptor.rs

use crate::error::{FerryError, FerryResult};
use crate::store::{FsStore, MemoryStore, StoreHandle};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration a store can be created from.
///
/// ```json
/// { "id": "output", "type": "fs", "path": "/data/output" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDescriptor {
  pub id: String,
  #[serde(flatten)]
  pub kind: StoreKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreKind {
  Fs { path: PathBuf },
  Memory,
}

impl StoreDescriptor {
  pub fn fs(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    StoreDescriptor {
      id: id.into(),
      kind: StoreKind::Fs { path: path.into() },
    }
  }

  pub fn memory(id: impl Into<String>) -> Self {
    StoreDescriptor {
      id: id.into(),
      kind: StoreKind::Memory,
    }
  }

  /// Builds the backend this descriptor describes.
  pub async fn open(&self) -> FerryResult<StoreHandle> {
    match &self.kind {
      StoreKind::Fs { path } => Ok(Arc::new(FsStore::create(self.id.clone(), path.clone()).await?)),
      StoreKind::Memory => Ok(Arc::new(MemoryStore::new(self.id.clone()))),
    }
  }
}

/// A per-hook store reference as found in the task context: a bare id, a full
/// descriptor, or an object carrying only an id.
///
/// An object with a `type` key is always read as a descriptor, so an unknown
/// store type is reported rather than taken for a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoreConfig {
  Id(String),
  Descriptor(StoreDescriptor),
  Reference { id: String },
}

impl<'de> Deserialize<'de> for StoreConfig {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    StoreConfig::parse(Value::deserialize(deserializer)?).map_err(de::Error::custom)
  }
}

impl StoreConfig {
  pub fn from_value(value: &Value) -> FerryResult<Self> {
    StoreConfig::parse(value.clone())
      .map_err(|e| FerryError::Config(format!("unrecognized store reference {}: {}", value, e)))
  }

  fn parse(value: Value) -> Result<Self, String> {
    match value {
      Value::String(id) => Ok(StoreConfig::Id(id)),
      Value::Object(map) if map.contains_key("type") => serde_json::from_value(Value::Object(map))
        .map(StoreConfig::Descriptor)
        .map_err(|e| e.to_string()),
      Value::Object(map) => match map.get("id").and_then(Value::as_str) {
        Some(id) => Ok(StoreConfig::Reference { id: id.to_string() }),
        None => Err("missing 'id'".to_string()),
      },
      other => Err(format!("expected a store id or descriptor, got {}", other)),
    }
  }

  pub fn id(&self) -> &str {
    match self {
      StoreConfig::Id(id) | StoreConfig::Reference { id } => id,
      StoreConfig::Descriptor(descriptor) => &descriptor.id,
    }
  }

  pub fn descriptor(&self) -> Option<&StoreDescriptor> {
    match self {
      StoreConfig::Descriptor(descriptor) => Some(descriptor),
      _ => None,
    }
  }
}
