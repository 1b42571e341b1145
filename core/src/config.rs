// ferry/src/config.rs

//! Job configuration: the stores a job works with and the hooks it runs.
//!
//! ```yaml
//! stores:
//!   - id: input
//!     type: fs
//!     path: ./data/input
//!   - id: output
//!     type: memory
//! store: output
//! hooks:
//!   after:
//!     readJson: { storePath: input.inputStore }
//!     transformJson: { mapping: { "nested.value": value } }
//!     writeJson: {}
//! ```

use crate::core::context::{HookContext, HookType};
use crate::core::context_data::ContextData;
use crate::error::{FerryError, FerryResult};
use crate::pipeline::definition::{HookPipeline, HookSpec};
use crate::registry::HookRegistry;
use crate::store::{StoreDescriptor, StoreHandle, StoresService};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobConfig {
  /// Stores created when the job is built.
  pub stores: Vec<StoreDescriptor>,
  /// Id of the default store handed to every task.
  pub store: Option<String>,
  /// Id of the default template store.
  pub template_store: Option<String>,
  pub hooks: HookSpec,
}

impl JobConfig {
  pub fn from_json_str(json: &str) -> FerryResult<Self> {
    serde_json::from_str(json).map_err(|e| FerryError::Config(format!("invalid JSON job configuration: {}", e)))
  }

  pub fn from_yaml_str(yaml: &str) -> FerryResult<Self> {
    serde_yaml::from_str(yaml).map_err(|e| FerryError::Config(format!("invalid YAML job configuration: {}", e)))
  }

  /// Loads a configuration file, YAML for `.yaml`/`.yml` and JSON otherwise.
  pub fn from_path(path: impl AsRef<Path>) -> FerryResult<Self> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| FerryError::io(e, "read", path.display().to_string()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
      _ => Self::from_json_str(&contents),
    }
  }

  /// Activates the hooks against `registry`, then creates the declared stores
  /// in a fresh [`StoresService`].
  #[instrument(name = "JobConfig::build", skip_all, fields(num_stores = self.stores.len()), err(Display))]
  pub async fn build(&self, registry: &HookRegistry) -> FerryResult<Job> {
    let pipeline = registry.activate_hooks(&self.hooks)?;
    let stores = Arc::new(StoresService::new());
    for descriptor in &self.stores {
      stores.create(descriptor).await?;
    }
    let default_store = self.store.as_deref().map(|id| stores.get(id)).transpose()?;
    let template_store = self.template_store.as_deref().map(|id| stores.get(id)).transpose()?;
    event!(Level::INFO, stores = ?stores.ids(), "Job built.");
    Ok(Job {
      stores,
      store: default_store,
      template_store,
      pipeline,
    })
  }
}

/// A built job: live stores plus the activated hook pipeline.
#[derive(Debug)]
pub struct Job {
  stores: Arc<StoresService>,
  store: Option<StoreHandle>,
  template_store: Option<StoreHandle>,
  pipeline: HookPipeline,
}

impl Job {
  /// Creates the context of task `id`, wired to the job's stores.
  pub fn context(&self, id: &str) -> ContextData<HookContext> {
    let mut ctx = HookContext::new(HookType::Before, id).with_stores_service(self.stores.clone());
    ctx.params.store = self.store.clone();
    ctx.params.template_store = self.template_store.clone();
    ContextData::new(ctx)
  }

  /// Runs task `id` through the pipeline around `action` and returns its
  /// final context.
  pub async fn run<A, Fut>(&self, id: &str, action: A) -> FerryResult<ContextData<HookContext>>
  where
    A: FnOnce(ContextData<HookContext>) -> Fut,
    Fut: Future<Output = FerryResult<()>>,
  {
    let ctx = self.context(id);
    self.pipeline.run(ctx.clone(), action).await?;
    Ok(ctx)
  }

  pub fn pipeline(&self) -> &HookPipeline {
    &self.pipeline
  }

  pub fn pipeline_mut(&mut self) -> &mut HookPipeline {
    &mut self.pipeline
  }

  pub fn stores(&self) -> &Arc<StoresService> {
    &self.stores
  }
}
