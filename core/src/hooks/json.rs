// ferry/src/hooks/json.rs

//! JSON hooks: `writeJson`, `readJson`, `transformJson` and `mergeJson`.

use crate::core::context::HookType;
use crate::core::hook::{hook_fn, HookFn};
use crate::core::value_path::ValuePath;
use crate::error::{FerryError, FerryResult};
use crate::hooks::{load_value, read_artifact, store_value, write_artifact};
use crate::store::{StoreLookup, WriteParams};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{event, Level};

pub const WRITE_JSON: &str = "writeJson";
pub const READ_JSON: &str = "readJson";
pub const TRANSFORM_JSON: &str = "transformJson";
pub const MERGE_JSON: &str = "mergeJson";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteJsonOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
  pub output_type: Option<String>,
  pub storage_options: WriteParams,
}

/// Serializes the artifact and writes it as `<input.id>.json`.
pub fn write_json(options: WriteJsonOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      let id = ctx_data.with(|ctx| {
        ctx.ensure_phase(WRITE_JSON, HookType::After)?;
        ctx.require_id(WRITE_JSON)
      })?;
      let store = StoreLookup::new(WRITE_JSON)
        .config_path(options.store_path.as_deref())
        .resolve(&ctx_data)
        .await?;
      let json = ctx_data.with(|ctx| load_value(ctx, options.data_path.as_deref()));
      let bytes = serde_json::to_vec(&json).map_err(|e| FerryError::Serialize {
        format: "JSON",
        message: e.to_string(),
      })?;
      let mut params = options.storage_options.clone();
      params.content_type.get_or_insert_with(|| "application/json".to_string());
      write_artifact(
        WRITE_JSON,
        &ctx_data,
        &store,
        format!("{}.json", id),
        Bytes::from(bytes),
        &params,
        options.output_type.clone(),
      )
      .await
    }
  })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadJsonOptions {
  pub data_path: Option<String>,
  pub store_path: Option<String>,
}

/// Reads `<id>.json` back and stores the parsed value at the data path.
pub fn read_json(options: ReadJsonOptions) -> HookFn {
  let options = Arc::new(options);
  hook_fn(move |ctx_data| {
    let options = options.clone();
    async move {
      ctx_data.with(|ctx| ctx.ensure_phase(READ_JSON, HookType::After))?;
      let (key, bytes) = read_artifact(READ_JSON, &ctx_data, options.store_path.as_deref(), &[".json"]).await?;
      let json: Value = serde_json::from_slice(&bytes).map_err(|e| FerryError::Parse {
        format: "JSON",
        key,
        message: e.to_string(),
      })?;
      store_value(&ctx_data, options.data_path.as_deref(), json)
    }
  })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformJsonOptions {
  pub data_path: Option<String>,
  /// Source path to destination path.
  pub mapping: Map<String, Value>,
  pub pick: Option<Vec<String>>,
  pub omit: Option<Vec<String>>,
  /// Replaces an object artifact by the array of its values before anything else.
  pub to_array: bool,
  /// Deep-merged into every element once the other steps are done.
  pub merge: Option<Map<String, Value>>,
}

/// Compiled form of [`TransformJsonOptions`].
#[derive(Debug, Clone)]
struct Transform {
  data_path: Option<String>,
  mapping: Vec<(ValuePath, ValuePath)>,
  pick: Option<Vec<ValuePath>>,
  omit: Vec<ValuePath>,
  to_array: bool,
  merge: Option<Value>,
}

/// Reshapes every element of the artifact in place.
///
/// Steps run in this order: `toArray`, `mapping`, `pick`, `omit`, `merge`.
/// Fails at bind time when a mapping destination is not a string.
pub fn transform_json(options: TransformJsonOptions) -> FerryResult<HookFn> {
  let mapping = options
    .mapping
    .iter()
    .map(|(source, destination)| match destination {
      Value::String(destination) => Ok((ValuePath::parse(source), ValuePath::parse(destination))),
      other => Err(FerryError::configuration(
        TRANSFORM_JSON,
        format!("mapping for '{}' must be a path string, got {}", source, other),
      )),
    })
    .collect::<FerryResult<Vec<_>>>()?;
  let transform = Arc::new(Transform {
    data_path: options.data_path,
    mapping,
    pick: options.pick.map(|paths| paths.iter().map(|p| ValuePath::parse(p)).collect()),
    omit: options.omit.unwrap_or_default().iter().map(|p| ValuePath::parse(p)).collect(),
    to_array: options.to_array,
    merge: options.merge.map(Value::Object),
  });

  Ok(hook_fn(move |ctx_data| {
    let transform = transform.clone();
    async move {
      ctx_data.update(|ctx| {
        ctx.ensure_phase(TRANSFORM_JSON, HookType::After)?;
        let path = transform.data_path.as_deref().unwrap_or(super::DEFAULT_DATA_PATH);
        match ctx.get_path_mut(path) {
          Some(artifact) => transform.apply(artifact),
          None => {
            event!(Level::DEBUG, data_path = path, "No artifact to transform.");
            Ok(())
          }
        }
      })
    }
  }))
}

impl Transform {
  fn apply(&self, artifact: &mut Value) -> FerryResult<()> {
    if self.to_array {
      if let Value::Object(map) = &mut *artifact {
        let values = std::mem::take(map).into_iter().map(|(_, v)| v).collect();
        *artifact = Value::Array(values);
      }
    }

    let elements = elements_mut(artifact)?;
    event!(Level::DEBUG, elements = elements.len(), rules = self.mapping.len(), "Transforming artifact.");

    for element in elements {
      if !element.is_object() {
        return Err(FerryError::transform(TRANSFORM_JSON, format!("cannot transform non-object element {}", element)));
      }
      self.apply_mapping(element)?;
      if let Some(pick) = &self.pick {
        let mut picked = Value::Object(Map::new());
        for path in pick {
          if let Some(value) = path.get(element) {
            path.set(&mut picked, value.clone());
          }
        }
        *element = picked;
      }
      for path in &self.omit {
        path.unset(element);
      }
      if let Some(merge) = &self.merge {
        deep_merge(element, merge);
      }
    }
    Ok(())
  }

  /// Copies every rule in declaration order against the live element, so a
  /// later rule reading an earlier rule's destination sees the copied value.
  /// Sources are erased only once every copy is done. A source that is a
  /// strict ancestor of its own rule's destination is not erased.
  fn apply_mapping(&self, element: &mut Value) -> FerryResult<()> {
    for (source, destination) in &self.mapping {
      let value = source
        .resolve(element)
        .map_err(|e| FerryError::transform(TRANSFORM_JSON, e.to_string()))?
        .cloned();
      match value {
        Some(value) => destination.set(element, value),
        None => event!(Level::TRACE, source = %source, "Mapping source absent, skipped."),
      }
    }

    for (source, destination) in &self.mapping {
      let (src, dst) = (source.segments(), destination.segments());
      if !(dst.len() > src.len() && dst.starts_with(src)) {
        source.unset(element);
      }
    }
    Ok(())
  }
}

/// The elements of an artifact: the items of an array, or the value itself.
/// `null` has no elements.
fn elements_mut(artifact: &mut Value) -> FerryResult<Vec<&mut Value>> {
  if artifact.is_object() {
    return Ok(vec![artifact]);
  }
  match artifact {
    Value::Array(items) => Ok(items.iter_mut().collect()),
    Value::Null => Ok(Vec::new()),
    other => Err(FerryError::transform(
      TRANSFORM_JSON,
      format!("artifact must be an object or an array, got {}", other),
    )),
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeJsonOptions {
  /// Path of the data inside each result, and of the merged data in the output.
  pub data_path: Option<String>,
}

/// Deep-merges the data of every result in the `output` array, in order, and
/// replaces the output with `{ <dataPath>: merged }`.
pub fn merge_json(options: MergeJsonOptions) -> HookFn {
  let data_path = Arc::new(options.data_path.unwrap_or_else(|| "data".to_string()));
  hook_fn(move |ctx_data| {
    let data_path = data_path.clone();
    async move {
      ctx_data.update(|ctx| {
        ctx.ensure_phase(MERGE_JSON, HookType::After)?;
        let Value::Array(results) = &ctx.output else {
          return Err(FerryError::transform(MERGE_JSON, "the output must be an array of results"));
        };
        let path = ValuePath::parse(&data_path);
        let mut merged = Value::Object(Map::new());
        for data in results.iter().filter_map(|result| path.get(result)) {
          deep_merge(&mut merged, data);
        }
        event!(Level::DEBUG, results = results.len(), "Results merged.");
        ctx.output = Value::Object(Map::new());
        ctx.set_path(&format!("output.{}", data_path), merged)
      })
    }
  })
}

/// Recursively merges `source` into `target`. Objects merge key by key and
/// arrays index by index; any other source value replaces the target.
pub(crate) fn deep_merge(target: &mut Value, source: &Value) {
  match (target, source) {
    (Value::Object(target), Value::Object(source)) => {
      for (key, value) in source {
        match target.get_mut(key) {
          Some(existing) => deep_merge(existing, value),
          None => {
            target.insert(key.clone(), value.clone());
          }
        }
      }
    }
    (Value::Array(target), Value::Array(source)) => {
      for (index, value) in source.iter().enumerate() {
        match target.get_mut(index) {
          Some(existing) => deep_merge(existing, value),
          None => target.push(value.clone()),
        }
      }
    }
    (target, source) => *target = source.clone(),
  }
}
