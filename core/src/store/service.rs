// ferry/src/store/service.rs

//! Registry of live stores keyed by id.

use crate::error::{FerryError, FerryResult};
use crate::store::{StoreConfig, StoreDescriptor, StoreHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{event, instrument, Level};

/// Holds every store created during the lifetime of a service. Stores are never
/// dropped implicitly; they live as long as the service does.
#[derive(Debug, Default)]
pub struct StoresService {
  stores: Mutex<HashMap<String, StoreHandle>>,
}

impl StoresService {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, id: &str) -> FerryResult<StoreHandle> {
    self
      .stores
      .lock()
      .get(id)
      .cloned()
      .ok_or_else(|| FerryError::UnknownStore { id: id.to_string() })
  }

  pub fn contains(&self, id: &str) -> bool {
    self.stores.lock().contains_key(id)
  }

  pub fn ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.stores.lock().keys().cloned().collect();
    ids.sort();
    ids
  }

  /// Registers a store built by the host (e.g. a [`crate::store::BucketStore`]).
  pub fn insert(&self, store: StoreHandle) -> FerryResult<StoreHandle> {
    let mut stores = self.stores.lock();
    let id = store.id().to_string();
    if stores.contains_key(&id) {
      return Err(FerryError::StoreAlreadyExists { id });
    }
    stores.insert(id, store.clone());
    Ok(store)
  }

  /// Creates and registers the store described by `descriptor`.
  ///
  /// Fails with [`FerryError::StoreAlreadyExists`] when the id is taken, including
  /// when a concurrent `create` for the same id wins while the backend is being
  /// opened. In that case the freshly opened backend is discarded.
  #[instrument(name = "StoresService::create", skip_all, fields(store_id = %descriptor.id), err(Display))]
  pub async fn create(&self, descriptor: &StoreDescriptor) -> FerryResult<StoreHandle> {
    if self.contains(&descriptor.id) {
      return Err(FerryError::StoreAlreadyExists {
        id: descriptor.id.clone(),
      });
    }
    let store = descriptor.open().await?;
    let mut stores = self.stores.lock();
    if stores.contains_key(&descriptor.id) {
      event!(Level::DEBUG, "Store registered concurrently, discarding duplicate backend.");
      return Err(FerryError::StoreAlreadyExists {
        id: descriptor.id.clone(),
      });
    }
    stores.insert(descriptor.id.clone(), store.clone());
    event!(Level::INFO, "Store created.");
    Ok(store)
  }

  /// Fetches the referenced store, creating it from an inline descriptor when it
  /// does not exist yet. A create that loses a race falls back to fetching the
  /// store the winner registered.
  pub async fn get_or_create(&self, config: &StoreConfig) -> FerryResult<StoreHandle> {
    let err = match self.get(config.id()) {
      Ok(store) => return Ok(store),
      Err(err) => err,
    };
    let Some(descriptor) = config.descriptor() else {
      return Err(err);
    };
    match self.create(descriptor).await {
      Ok(store) => Ok(store),
      Err(FerryError::StoreAlreadyExists { id }) => {
        event!(Level::DEBUG, store_id = %id, "Store already exists, fetching it instead.");
        self.get(&id)
      }
      Err(other) => Err(other),
    }
  }
}
