// ferry/src/registry.rs

//! Defines `HookRegistry`, the name-keyed table of hook factories that
//! declarative hook specifications are compiled against.
//!
//! A registry is meant to be built once at process start (usually through
//! [`HookRegistry::with_builtins`]), extended with host-specific hooks, and then
//! shared (e.g. in an `Arc`) by every pipeline activated from it. Lookups take a
//! read lock only, so concurrent activations do not contend.

use crate::core::context::HookType;
use crate::core::hook::{HookFactory, HookFn};
use crate::error::{FerryError, FerryResult};
use crate::pipeline::definition::{HookPipeline, HookSpec};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

#[derive(Clone)]
struct HookEntry {
  factory: HookFactory,
  phase: Option<HookType>,
}

#[derive(Default)]
pub struct HookRegistry {
  entries: RwLock<HashMap<String, HookEntry>>,
}

impl HookRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a registry holding every built-in hook.
  pub fn with_builtins() -> Self {
    let registry = Self::new();
    crate::hooks::register_builtins(&registry);
    registry
  }

  /// Registers `factory` under `name`, replacing any previous registration,
  /// built-ins included.
  pub fn register_hook<F>(&self, name: &str, factory: F)
  where
    F: Fn(&Value) -> FerryResult<HookFn> + Send + Sync + 'static,
  {
    self.insert(name, Arc::new(factory), None);
  }

  /// Like [`HookRegistry::register_hook`], recording the phase the hook is written for.
  pub fn register_hook_for_phase<F>(&self, name: &str, phase: HookType, factory: F)
  where
    F: Fn(&Value) -> FerryResult<HookFn> + Send + Sync + 'static,
  {
    self.insert(name, Arc::new(factory), Some(phase));
  }

  fn insert(&self, name: &str, factory: HookFactory, phase: Option<HookType>) {
    let previous = self
      .entries
      .write()
      .insert(name.to_string(), HookEntry { factory, phase });
    if previous.is_some() {
      event!(Level::DEBUG, hook = name, "Hook registration replaced.");
    } else {
      event!(Level::TRACE, hook = name, "Hook registered.");
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.read().contains_key(name)
  }

  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
    names.sort();
    names
  }

  /// The phase a hook was registered for, if it declared one.
  pub fn phase_hint(&self, name: &str) -> Option<HookType> {
    self.entries.read().get(name).and_then(|e| e.phase)
  }

  /// Binds the hook registered under `name` to `config`.
  pub fn bind(&self, name: &str, config: &Value) -> FerryResult<HookFn> {
    // The factory runs outside the lock so it may itself consult the registry.
    let factory = self
      .entries
      .read()
      .get(name)
      .map(|e| e.factory.clone())
      .ok_or_else(|| FerryError::UnknownHook {
        hook_name: name.to_string(),
      })?;
    factory(config)
  }

  /// Compiles `spec` into ordered before/after hook sequences.
  pub fn activate_hooks(&self, spec: &HookSpec) -> FerryResult<HookPipeline> {
    HookPipeline::activate(self, spec)
  }
}

impl std::fmt::Debug for HookRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HookRegistry").field("hooks", &self.names()).finish()
  }
}
