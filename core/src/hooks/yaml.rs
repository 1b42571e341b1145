// ferry/src/hooks/yaml.rs

use crate::core::context::HookType;
use crate::core::hook::{hook_fn, HookFn};
use crate::error::FerryError;
use crate::hooks::{load_value, read_artifact, store_value, write_artifact};
use crate::store::{StoreLookup, WriteParams};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const READ_YAML: &str = "readYAML";
pub const WRITE_YAML: &str = "writeYAML";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadYamlOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
}

pub fn read_yaml(options: ReadYamlOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      let (key, bytes) =
        read_artifact(READ_YAML, &ctx_data, options.store_path.as_deref(), &[".yaml", ".yml"]).await?;
      let json: Value = serde_yaml::from_slice(&bytes).map_err(|e| FerryError::Parse {
        format: "YAML",
        key,
        message: e.to_string(),
      })?;
      store_value(&ctx_data, options.data_path.as_deref(), json)
    }
  })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteYamlOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
  pub output_type: Option<String>,
  pub storage_options: WriteParams,
}

/// Writes the artifact as `<input.id>.yaml`.
pub fn write_yaml(options: WriteYamlOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      let id = ctx_data.with(|ctx| {
        ctx.ensure_phase(WRITE_YAML, HookType::After)?;
        ctx.require_id(WRITE_YAML)
      })?;
      let store = StoreLookup::new(WRITE_YAML)
        .config_path(options.store_path.as_deref())
        .resolve(&ctx_data)
        .await?;
      let json = ctx_data.with(|ctx| load_value(ctx, options.data_path.as_deref()));
      let yaml = serde_yaml::to_string(&json).map_err(|e| FerryError::Serialize {
        format: "YAML",
        message: e.to_string(),
      })?;
      write_artifact(
        WRITE_YAML,
        &ctx_data,
        &store,
        format!("{}.yaml", id),
        Bytes::from(yaml),
        &options.storage_options,
        options.output_type.clone(),
      )
      .await
    }
  })
}
