// ferry/src/hooks/mod.rs

//! Built-in hooks.
//!
//! Every hook is exposed twice: as a constructor taking its typed options
//! (e.g. [`json::write_json`]) and as a registry entry under its camelCase name
//! (e.g. `writeJson`) whose factory deserializes the options from the hook
//! declaration. Unknown option fields are ignored.

pub mod csv;
pub mod geojson;
pub mod json;
pub mod template;
pub mod utils;
pub mod xml;
pub mod yaml;

use crate::core::context::{HookContext, HookType};
use crate::core::context_data::ContextData;
use crate::error::{FerryError, FerryResult};
use crate::registry::HookRegistry;
use crate::store::{StoreHandle, StoreLookup, StoreRequirement, WriteParams};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{event, Level};

/// Where hooks read and write the artifact unless configured otherwise.
pub const DEFAULT_DATA_PATH: &str = "output.data";

/// Registers every built-in hook under its camelCase name.
pub fn register_builtins(registry: &HookRegistry) {
  registry.register_hook_for_phase(json::WRITE_JSON, HookType::After, |config| {
    Ok(json::write_json(parse_options(json::WRITE_JSON, config)?))
  });
  registry.register_hook_for_phase(json::READ_JSON, HookType::After, |config| {
    Ok(json::read_json(parse_options(json::READ_JSON, config)?))
  });
  registry.register_hook_for_phase(json::TRANSFORM_JSON, HookType::After, |config| {
    json::transform_json(parse_options(json::TRANSFORM_JSON, config)?)
  });
  registry.register_hook_for_phase(json::MERGE_JSON, HookType::After, |config| {
    Ok(json::merge_json(parse_options(json::MERGE_JSON, config)?))
  });
  registry.register_hook_for_phase(geojson::CONVERT_TO_GEOJSON, HookType::After, |config| {
    Ok(geojson::convert_to_geojson(parse_options(geojson::CONVERT_TO_GEOJSON, config)?))
  });
  registry.register_hook_for_phase(template::WRITE_TEMPLATE, HookType::After, |config| {
    template::write_template(parse_options(template::WRITE_TEMPLATE, config)?)
  });
  registry.register_hook(xml::READ_XML, |config| {
    Ok(xml::read_xml(parse_options(xml::READ_XML, config)?))
  });
  registry.register_hook(yaml::READ_YAML, |config| {
    Ok(yaml::read_yaml(parse_options(yaml::READ_YAML, config)?))
  });
  registry.register_hook_for_phase(yaml::WRITE_YAML, HookType::After, |config| {
    Ok(yaml::write_yaml(parse_options(yaml::WRITE_YAML, config)?))
  });
  registry.register_hook(csv::READ_CSV, |config| {
    Ok(csv::read_csv(parse_options(csv::READ_CSV, config)?))
  });
  registry.register_hook_for_phase(csv::WRITE_CSV, HookType::After, |config| {
    Ok(csv::write_csv(parse_options(csv::WRITE_CSV, config)?))
  });
  registry.register_hook(utils::CLEAR_DATA, |config| {
    Ok(utils::clear_data(parse_options(utils::CLEAR_DATA, config)?))
  });
  registry.register_hook_for_phase(utils::CLEAR_OUTPUTS, HookType::After, |config| {
    Ok(utils::clear_outputs(parse_options(utils::CLEAR_OUTPUTS, config)?))
  });
  registry.register_hook_for_phase(utils::BASIC_AUTH, HookType::Before, |config| {
    Ok(utils::basic_auth(parse_options(utils::BASIC_AUTH, config)?))
  });
}

/// Deserializes hook options; `null` yields the defaults.
pub fn parse_options<T: DeserializeOwned + Default>(hook_name: &str, config: &Value) -> FerryResult<T> {
  if config.is_null() {
    return Ok(T::default());
  }
  serde_json::from_value(config.clone()).map_err(|source| FerryError::InvalidOptions {
    hook_name: hook_name.to_string(),
    source,
  })
}

/// Appends `extension` to `id` unless it already ends with it.
pub(crate) fn key_with_extension(id: &str, extension: &str) -> String {
  if id.ends_with(extension) {
    id.to_string()
  } else {
    format!("{}{}", id, extension)
  }
}

/// Id of the artifact a reader hook loads: the output's id in the after phase,
/// falling back to the input's id.
pub(crate) fn artifact_id(ctx: &HookContext, hook_name: &str) -> FerryResult<String> {
  if ctx.kind == HookType::After {
    if let Some(id) = ctx.get_path("output.id").and_then(Value::as_str) {
      return Ok(id.to_string());
    }
  }
  ctx.require_id(hook_name)
}

/// Resolves a path- or buffer-addressable store and reads the artifact named
/// after the task from it. Returns the key read and its bytes.
pub(crate) async fn read_artifact(
  hook_name: &str,
  ctx_data: &ContextData<HookContext>,
  store_path: Option<&str>,
  extensions: &[&str],
) -> FerryResult<(String, Bytes)> {
  let store = StoreLookup::new(hook_name)
    .config_path(store_path)
    .require(StoreRequirement::PathOrBuffers)
    .resolve(ctx_data)
    .await?;
  let id = ctx_data.with(|ctx| artifact_id(ctx, hook_name))?;
  let key = if extensions.iter().any(|ext| id.ends_with(ext)) {
    id
  } else {
    key_with_extension(&id, extensions.first().copied().unwrap_or_default())
  };
  event!(Level::DEBUG, hook = hook_name, store_id = store.id(), %key, "Reading artifact.");
  let bytes = store.read(&key).await?;
  Ok((key, bytes))
}

/// Writes `bytes` under `key` and records the key in the output manifest.
pub(crate) async fn write_artifact(
  hook_name: &str,
  ctx_data: &ContextData<HookContext>,
  store: &StoreHandle,
  key: String,
  bytes: Bytes,
  params: &WriteParams,
  output_type: Option<String>,
) -> FerryResult<()> {
  event!(Level::DEBUG, hook = hook_name, store_id = store.id(), %key, size = bytes.len(), "Writing artifact.");
  store.write(&key, bytes, params).await?;
  ctx_data.update(|ctx| ctx.add_output(key, output_type));
  Ok(())
}

/// Stores `value` at `path`, or at [`DEFAULT_DATA_PATH`].
pub(crate) fn store_value(ctx_data: &ContextData<HookContext>, path: Option<&str>, value: Value) -> FerryResult<()> {
  ctx_data.update(|ctx| ctx.set_path(path.unwrap_or(DEFAULT_DATA_PATH), value))
}

/// Clone of the artifact at `path` (or [`DEFAULT_DATA_PATH`]), `{}` when absent.
pub(crate) fn load_value(ctx: &HookContext, path: Option<&str>) -> Value {
  ctx
    .get_path(path.unwrap_or(DEFAULT_DATA_PATH))
    .cloned()
    .unwrap_or_else(|| Value::Object(Default::default()))
}
