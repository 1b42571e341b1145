// ferry/src/core/context.rs

//! Defines [`HookContext`], the mutable record threaded through one pipeline run.
//!
//! The context has two JSON-valued roots hooks address by path:
//!  - `input`: the task's source locator (`input.id`) plus request parameters,
//!    including an optional per-hook store reference (`input.store`).
//!  - `output`: the accumulating result, either a single value (usually with the
//!    artifact under `output.data`) or an array of sibling results for fan-in.
//!
//! Paths therefore always start with `input` or `output`, e.g. `output.data` or
//! `input.options.headers`.

use crate::core::value_path::{PathSegment, ValuePath};
use crate::error::{FerryError, FerryResult};
use crate::store::{StoreHandle, StoresService};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// Which half of the pipeline is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookType {
  Before,
  After,
}

impl fmt::Display for HookType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HookType::Before => f.write_str("before"),
      HookType::After => f.write_str("after"),
    }
  }
}

/// One entry of the output manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
  pub id: String,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
}

/// Run-wide parameters: default stores plus a free-form bag.
#[derive(Debug, Clone, Default)]
pub struct HookParams {
  /// Default store for hooks that do not configure their own.
  pub store: Option<StoreHandle>,
  /// Store templates are read from.
  pub template_store: Option<StoreHandle>,
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct HookContext {
  pub kind: HookType,
  pub input: Value,
  pub output: Value,
  pub params: HookParams,
  /// Everything writer hooks produced, in production order. Only appended to.
  pub outputs: Vec<Output>,
  /// Service used to look up stores referenced by id.
  pub stores: Option<Arc<StoresService>>,
}

impl HookContext {
  /// Creates a context for task `id`. The output starts as `{ "id": <id> }`.
  pub fn new(kind: HookType, id: impl Into<String>) -> Self {
    let id = id.into();
    HookContext {
      kind,
      input: json!({ "id": id }),
      output: json!({ "id": id }),
      params: HookParams::default(),
      outputs: Vec::new(),
      stores: None,
    }
  }

  pub fn with_store(mut self, store: StoreHandle) -> Self {
    self.params.store = Some(store);
    self
  }

  pub fn with_template_store(mut self, store: StoreHandle) -> Self {
    self.params.template_store = Some(store);
    self
  }

  pub fn with_stores_service(mut self, service: Arc<StoresService>) -> Self {
    self.stores = Some(service);
    self
  }

  pub fn with_input(mut self, input: Value) -> Self {
    self.input = input;
    self
  }

  pub fn with_output(mut self, output: Value) -> Self {
    self.output = output;
    self
  }

  /// Sets `output.data`.
  pub fn with_data(mut self, data: Value) -> Self {
    ValuePath::parse("data").set(&mut self.output, data);
    self
  }

  /// The task id, taken from `input.id`.
  pub fn id(&self) -> Option<&str> {
    self.input.get("id").and_then(Value::as_str)
  }

  pub(crate) fn require_id(&self, hook_name: &str) -> FerryResult<String> {
    self
      .id()
      .map(str::to_string)
      .ok_or_else(|| FerryError::configuration(hook_name, "the task context has no 'input.id'"))
  }

  pub fn ensure_phase(&self, hook_name: &str, expected: HookType) -> FerryResult<()> {
    if self.kind != expected {
      return Err(FerryError::WrongPhase {
        hook_name: hook_name.to_string(),
        expected,
      });
    }
    Ok(())
  }

  pub fn get_path(&self, path: &str) -> Option<&Value> {
    let (root, rest) = self.split_root(path)?;
    rest.get(root)
  }

  pub fn get_path_mut(&mut self, path: &str) -> Option<&mut Value> {
    let parsed = ValuePath::parse(path);
    let (head, rest) = parsed.segments().split_first()?;
    let root = self.root_mut(head)?;
    ValuePath::from_segments(rest).get_mut(root)
  }

  /// Writes `value` at `path`. Fails when the path does not start with
  /// `input` or `output`.
  pub fn set_path(&mut self, path: &str, value: Value) -> FerryResult<()> {
    let parsed = ValuePath::parse(path);
    let invalid = || FerryError::Config(format!("context path '{}' must start with 'input' or 'output'", path));
    let (head, rest) = parsed.segments().split_first().ok_or_else(invalid)?;
    let root = self.root_mut(head).ok_or_else(invalid)?;
    ValuePath::from_segments(rest).set(root, value);
    Ok(())
  }

  pub fn unset_path(&mut self, path: &str) -> Option<Value> {
    let parsed = ValuePath::parse(path);
    let (head, rest) = parsed.segments().split_first()?;
    let root = self.root_mut(head)?;
    if rest.is_empty() {
      return Some(std::mem::replace(root, Value::Null));
    }
    ValuePath::from_segments(rest).unset(root)
  }

  /// Appends an entry to the output manifest.
  pub fn add_output(&mut self, id: impl Into<String>, kind: Option<String>) {
    self.outputs.push(Output { id: id.into(), kind });
  }

  fn split_root(&self, path: &str) -> Option<(&Value, ValuePath)> {
    let parsed = ValuePath::parse(path);
    let (head, rest) = parsed.segments().split_first()?;
    let root = match head {
      PathSegment::Key(k) if k == "input" => &self.input,
      PathSegment::Key(k) if k == "output" => &self.output,
      _ => return None,
    };
    Some((root, ValuePath::from_segments(rest)))
  }

  fn root_mut(&mut self, head: &PathSegment) -> Option<&mut Value> {
    match head {
      PathSegment::Key(k) if k == "input" => Some(&mut self.input),
      PathSegment::Key(k) if k == "output" => Some(&mut self.output),
      _ => None,
    }
  }
}
