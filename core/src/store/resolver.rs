// ferry/src/store/resolver.rs

//! Resolves the store a hook should use.
//!
//! Resolution order, first match wins:
//!  1. A per-hook store reference in the context at the configured path
//!     (default `input.store`): an id is looked up in the context's
//!     [`StoresService`](crate::store::StoresService); an inline descriptor is
//!     created on first use.
//!  2. The run-wide default in `params` for the requested [`StoreSlot`].
//!  3. Otherwise resolution fails with [`FerryError::StoreNotFound`].

use crate::core::context::HookContext;
use crate::core::context_data::ContextData;
use crate::error::{FerryError, FerryResult};
use crate::store::{StoreConfig, StoreHandle, StoreRequirement};
use serde_json::Value;
use tracing::{event, Level};

pub const DEFAULT_STORE_PATH: &str = "input.store";
pub const DEFAULT_TEMPLATE_STORE_PATH: &str = "input.templateStore";

/// Which run-wide default a lookup falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSlot {
  /// `params.store`
  Default,
  /// `params.template_store`
  Template,
}

#[derive(Debug, Clone)]
pub struct StoreLookup<'a> {
  hook_name: &'a str,
  config_path: &'a str,
  slot: StoreSlot,
  requirement: StoreRequirement,
}

impl<'a> StoreLookup<'a> {
  pub fn new(hook_name: &'a str) -> Self {
    StoreLookup {
      hook_name,
      config_path: DEFAULT_STORE_PATH,
      slot: StoreSlot::Default,
      requirement: StoreRequirement::Any,
    }
  }

  /// Lookup for the template source store of `hook_name`.
  pub fn template(hook_name: &'a str) -> Self {
    StoreLookup {
      hook_name,
      config_path: DEFAULT_TEMPLATE_STORE_PATH,
      slot: StoreSlot::Template,
      requirement: StoreRequirement::Any,
    }
  }

  /// Overrides the context path of the per-hook store reference. `None` keeps the default.
  pub fn config_path(mut self, path: Option<&'a str>) -> Self {
    if let Some(path) = path {
      self.config_path = path;
    }
    self
  }

  pub fn require(mut self, requirement: StoreRequirement) -> Self {
    self.requirement = requirement;
    self
  }

  pub async fn resolve(&self, ctx: &ContextData<HookContext>) -> FerryResult<StoreHandle> {
    let (config, service, fallback) = ctx.with(|c| {
      let config = c.get_path(self.config_path).filter(|v| is_present(v)).cloned();
      let fallback = match self.slot {
        StoreSlot::Default => c.params.store.clone(),
        StoreSlot::Template => c.params.template_store.clone(),
      };
      (config, c.stores.clone(), fallback)
    });

    let store = match config {
      Some(value) => {
        let config = StoreConfig::from_value(&value)?;
        event!(Level::DEBUG, hook = self.hook_name, store_id = config.id(), "Resolving hook-specific store.");
        let service = service.ok_or_else(|| FerryError::StoreNotFound {
          hook_name: self.hook_name.to_string(),
        })?;
        service.get_or_create(&config).await?
      }
      None => fallback.ok_or_else(|| FerryError::StoreNotFound {
        hook_name: self.hook_name.to_string(),
      })?,
    };

    if !self.requirement.is_satisfied_by(store.addressing()) {
      return Err(FerryError::UnsupportedStore {
        hook_name: self.hook_name.to_string(),
        required: self.requirement,
      });
    }
    event!(Level::TRACE, hook = self.hook_name, store_id = store.id(), "Store resolved.");
    Ok(store)
  }
}

fn is_present(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::String(s) => !s.is_empty(),
    _ => true,
  }
}
