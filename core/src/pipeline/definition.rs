// ferry/src/pipeline/definition.rs

//! Contains the declarative [`HookSpec`] and the activated [`HookPipeline`] it
//! compiles into.

use crate::core::context::HookType;
use crate::core::hook::HookFn;
use crate::error::{FerryError, FerryResult};
use crate::registry::HookRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{event, Level};

/// Declarative hook configuration:
///
/// ```json
/// { "before": { "basicAuth": {} }, "after": { "readJson": {}, "writeJson": { "outputType": "intermediate" } } }
/// ```
///
/// Entry order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookSpec {
  #[serde(default)]
  pub before: Map<String, Value>,
  #[serde(default)]
  pub after: Map<String, Value>,
}

impl HookSpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_json_str(json: &str) -> FerryResult<Self> {
    serde_json::from_str(json).map_err(|e| FerryError::Config(format!("invalid hook specification: {}", e)))
  }

  /// Appends (or reconfigures) a before hook.
  pub fn before(mut self, name: &str, config: Value) -> Self {
    self.before.insert(name.to_string(), config);
    self
  }

  pub fn after(mut self, name: &str, config: Value) -> Self {
    self.after.insert(name.to_string(), config);
    self
  }

  pub fn phase(&self, phase: HookType) -> &Map<String, Value> {
    match phase {
      HookType::Before => &self.before,
      HookType::After => &self.after,
    }
  }
}

/// A hook bound into a phase, kept with the name it was declared under.
#[derive(Clone)]
pub struct ActivatedHook {
  pub name: String,
  pub hook: HookFn,
}

impl std::fmt::Debug for ActivatedHook {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ActivatedHook").field("name", &self.name).finish()
  }
}

/// The two ordered hook sequences of a pipeline.
#[derive(Debug, Clone, Default)]
pub struct HookPipeline {
  pub(crate) before: Vec<ActivatedHook>,
  pub(crate) after: Vec<ActivatedHook>,
}

impl HookPipeline {
  /// Creates a pipeline with no hooks.
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn activate(registry: &HookRegistry, spec: &HookSpec) -> FerryResult<Self> {
    let mut pipeline = HookPipeline::new();
    for phase in [HookType::Before, HookType::After] {
      for (name, config) in spec.phase(phase) {
        if let Some(hint) = registry.phase_hint(name) {
          if hint != phase {
            event!(
              Level::WARN,
              hook = %name,
              declared = %phase,
              expected = %hint,
              "Hook activated in a phase it was not written for; it will fail when executed."
            );
          }
        }
        let hook = registry.bind(name, config)?;
        pipeline.phase_mut(phase).push(ActivatedHook {
          name: name.clone(),
          hook,
        });
      }
    }
    event!(
      Level::DEBUG,
      before = pipeline.before.len(),
      after = pipeline.after.len(),
      "Hooks activated."
    );
    Ok(pipeline)
  }

  pub fn phase(&self, phase: HookType) -> &[ActivatedHook] {
    match phase {
      HookType::Before => &self.before,
      HookType::After => &self.after,
    }
  }

  pub(crate) fn phase_mut(&mut self, phase: HookType) -> &mut Vec<ActivatedHook> {
    match phase {
      HookType::Before => &mut self.before,
      HookType::After => &mut self.after,
    }
  }

  pub fn hooks(&self, phase: HookType) -> impl Iterator<Item = &HookFn> {
    self.phase(phase).iter().map(|h| &h.hook)
  }

  pub fn names(&self, phase: HookType) -> Vec<&str> {
    self.phase(phase).iter().map(|h| h.name.as_str()).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.before.is_empty() && self.after.is_empty()
  }
}
