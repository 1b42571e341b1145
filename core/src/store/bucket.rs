// ferry/src/store/bucket.rs

//! Object-storage backed stores. The bucket is reached only through an
//! injected [`ObjectClient`]; such stores expose neither a path nor buffers,
//! so hooks that need either refuse them at resolution time.

use crate::error::{FerryError, FerryResult};
use crate::store::{Addressing, Store, WriteParams};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Minimal object-storage client contract (S3-like).
#[async_trait]
pub trait ObjectClient: Send + Sync {
  async fn get_object(&self, bucket: &str, key: &str) -> FerryResult<Option<Bytes>>;

  async fn put_object(&self, bucket: &str, key: &str, body: Bytes, params: &WriteParams) -> FerryResult<()>;

  async fn head_object(&self, bucket: &str, key: &str) -> FerryResult<bool>;

  async fn delete_object(&self, bucket: &str, key: &str) -> FerryResult<()>;
}

pub struct BucketStore {
  id: String,
  bucket: String,
  prefix: Option<String>,
  client: Arc<dyn ObjectClient>,
}

impl BucketStore {
  pub fn new(id: impl Into<String>, bucket: impl Into<String>, client: Arc<dyn ObjectClient>) -> Self {
    Self {
      id: id.into(),
      bucket: bucket.into(),
      prefix: None,
      client,
    }
  }

  /// Prepends `prefix/` to every key.
  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = Some(prefix.into().trim_end_matches('/').to_string());
    self
  }

  pub fn bucket(&self) -> &str {
    &self.bucket
  }

  fn object_key(&self, key: &str) -> String {
    match &self.prefix {
      Some(prefix) => format!("{}/{}", prefix, key),
      None => key.to_string(),
    }
  }
}

impl fmt::Debug for BucketStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BucketStore")
      .field("id", &self.id)
      .field("bucket", &self.bucket)
      .field("prefix", &self.prefix)
      .finish()
  }
}

#[async_trait]
impl Store for BucketStore {
  fn id(&self) -> &str {
    &self.id
  }

  fn addressing(&self) -> Addressing<'_> {
    Addressing::Opaque
  }

  async fn read(&self, key: &str) -> FerryResult<Bytes> {
    self
      .client
      .get_object(&self.bucket, &self.object_key(key))
      .await?
      .ok_or_else(|| FerryError::KeyNotFound {
        store: self.id.clone(),
        key: key.to_string(),
      })
  }

  async fn write(&self, key: &str, bytes: Bytes, params: &WriteParams) -> FerryResult<()> {
    self
      .client
      .put_object(&self.bucket, &self.object_key(key), bytes, params)
      .await
  }

  async fn exists(&self, key: &str) -> FerryResult<bool> {
    self.client.head_object(&self.bucket, &self.object_key(key)).await
  }

  async fn remove(&self, key: &str) -> FerryResult<()> {
    self.client.delete_object(&self.bucket, &self.object_key(key)).await
  }
}
